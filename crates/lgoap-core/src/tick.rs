/// Host clock sample passed into every agent tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }

    /// The following tick, same step length.
    pub fn next(self) -> Self {
        Self {
            tick: self.tick + 1,
            ..self
        }
    }
}
