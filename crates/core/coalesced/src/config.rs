use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Debug)]
/// Config values for [`CoalescionService`](crate::CoalescionService).
pub struct CoalescionServiceConfig {
    /// How long a successful result stays joinable after it settles
    pub grace_window: Duration,
    /// How many distinct operations are running at once
    pub max_concurrent: Option<usize>,
}

impl Default for CoalescionServiceConfig {
    fn default() -> Self {
        Self {
            grace_window: Duration::from_millis(50),
            max_concurrent: Some(100),
        }
    }
}
