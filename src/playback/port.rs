use crate::core::PlaybackError;

/// Whatever owns decode and transport of the composite file. Only seeks are
/// issued from here; retries, if any, are the implementation's business.
pub trait PlaybackPort: Send {
    fn seek(&mut self, offset_secs: f64) -> Result<(), PlaybackError>;
}

impl<P: PlaybackPort + ?Sized> PlaybackPort for Box<P> {
    fn seek(&mut self, offset_secs: f64) -> Result<(), PlaybackError> {
        (**self).seek(offset_secs)
    }
}
