//! Stage events emitted by the pipeline.
//!
//! The pipeline never renders anything itself. It pushes [`Progress`] values
//! into an optional `flume` channel and the caller decides what to draw.

use flume::Sender;
use strum::Display;

/// Position of an operation in its linear state machine.
///
/// Encryption walks `Reading → DerivingKey → Transforming → Framing →
/// Emitting → Done`; decryption swaps framing for `Unframing` and does it
/// before touching any key material. `Failed` can follow any stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum Stage {
    /// State of a consumer that has not received anything yet. The pipeline
    /// never sends it.
    #[default]
    #[strum(to_string = "Idle")]
    Idle,
    #[strum(to_string = "Reading")]
    Reading,
    #[strum(to_string = "Deriving key")]
    DerivingKey,
    #[strum(to_string = "Transforming")]
    Transforming,
    #[strum(to_string = "Framing")]
    Framing,
    #[strum(to_string = "Unframing")]
    Unframing,
    #[strum(to_string = "Emitting")]
    Emitting,
    #[strum(to_string = "Done")]
    Done,
    #[strum(to_string = "Failed")]
    Failed,
}

impl Stage {
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One progress event: the stage just entered and the overall percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub percent: u8,
}

/// Non-blocking sink for progress events.
///
/// A missing or disconnected receiver is not an error: the operation keeps
/// going whether or not anybody is watching.
#[derive(Clone, Default)]
pub(crate) struct Reporter {
    sender: Option<Sender<Progress>>,
}

impl Reporter {
    pub(crate) const fn new(sender: Option<Sender<Progress>>) -> Self {
        Self { sender }
    }

    #[inline]
    pub(crate) fn emit(&self, stage: Stage, percent: u8) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Progress { stage, percent: percent.min(100) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (tx, rx) = flume::unbounded();
        drop(rx);

        Reporter::new(Some(tx)).emit(Stage::Reading, 10);
        Reporter::default().emit(Stage::Done, 100);
    }

    #[test]
    fn test_emit_clamps_percent() {
        let (tx, rx) = flume::unbounded();
        Reporter::new(Some(tx)).emit(Stage::Done, 250);

        assert_eq!(rx.try_recv().unwrap(), Progress { stage: Stage::Done, percent: 100 });
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::DerivingKey.to_string(), "Deriving key");
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Emitting.is_terminal());
        assert_eq!(Stage::default(), Stage::Idle);
        assert!(!Stage::Idle.is_terminal());
    }
}
