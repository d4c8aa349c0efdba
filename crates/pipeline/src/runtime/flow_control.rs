/// Sizing for the hand-offs between stages.
///
/// A capacity of one is the closest a bounded channel gets to an unbuffered
/// rendezvous: a producer can run at most one item ahead of its consumer.
#[derive(Debug, Clone)]
pub struct FlowControlConfig {
    pub channel_capacity: usize,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
        }
    }
}

impl FlowControlConfig {
    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }

    pub fn capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}
