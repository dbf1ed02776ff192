use std::fmt::Debug;

/// T values are real-valued signal samples (f32, f64)
pub trait Float: ::num::Float + Debug + Default + Send + Sync {}

impl<T: ::num::Float + Debug + Default + Send + Sync> Float for T {}

/// Cast a configuration constant (always f64) into the sample type.
pub fn cast<S: Float>(value: f64) -> Option<S> {
    <S as ::num::NumCast>::from(value)
}
