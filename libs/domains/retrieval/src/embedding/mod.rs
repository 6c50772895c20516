mod clip;
mod hashed;
mod provider;

pub use clip::{ClipConfig, ClipHttpEmbedder};
pub use hashed::HashedEmbedder;
pub use provider::ImageEmbedder;

#[cfg(test)]
pub(crate) use provider::MockImageEmbedder;

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}
