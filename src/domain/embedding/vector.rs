//! Vector math and the wire encoding used for cached embeddings

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::DomainError;

/// Calculate cosine similarity between two vectors
///
/// Accumulates in `f64`. Identical non-zero vectors score exactly `1.0`.
/// Mismatched lengths, empty input and zero vectors score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_sq_a = 0.0f64;
    let mut norm_sq_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_sq_a += x * x;
        norm_sq_b += y * y;
    }

    if norm_sq_a == 0.0 || norm_sq_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_sq_a * norm_sq_b).sqrt()).clamp(-1.0, 1.0) as f32
}

/// Encodes a vector as base64 over little-endian `f32` bytes
pub fn encode_vector(vector: &[f32]) -> String {
    let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

/// Inverse of [`encode_vector`]
pub fn decode_vector(encoded: &str) -> Result<Vec<f32>, DomainError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DomainError::serialization(format!("Invalid embedding encoding: {}", e)))?;

    if bytes.len() % 4 != 0 {
        return Err(DomainError::serialization(format!(
            "Embedding byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
