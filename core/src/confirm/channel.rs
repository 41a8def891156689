use super::gate::{ConfirmationCallback, ConfirmationResponse};
use crate::tools::ToolCall;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const AFFIRMATIVES: &[&str] = &[
    "y", "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "confirm", "confirmed", "approve",
    "approved", "go ahead", "do it", "proceed",
];

/// True only for an explicit affirmative such as "yes" or "go ahead"
pub fn is_affirmative(text: &str) -> bool {
    let normalized: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '!' | ','))
        .collect();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    AFFIRMATIVES.contains(&normalized.as_str())
}

/// A confirmation question handed to the front-end
#[derive(Debug)]
pub struct ConfirmationRequest {
    pub call: ToolCall,
    pub prompt: String,
    responder: oneshot::Sender<ConfirmationResponse>,
}

impl ConfirmationRequest {
    pub fn approve(self) {
        let _ = self.responder.send(ConfirmationResponse::Approved);
    }

    pub fn deny(self) {
        let _ = self.responder.send(ConfirmationResponse::Denied);
    }

    /// Answer with free text; anything but an affirmative denies
    pub fn respond(self, answer: &str) {
        if is_affirmative(answer) {
            self.approve()
        } else {
            self.deny()
        }
    }
}

/// Callback that forwards each question over a channel and waits for the
/// reply. A dropped request counts as a denial.
#[derive(Clone)]
pub struct ChannelConfirmer {
    requests: mpsc::Sender<ConfirmationRequest>,
}

impl ChannelConfirmer {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConfirmationRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { requests: tx }, rx)
    }
}

#[async_trait]
impl ConfirmationCallback for ChannelConfirmer {
    async fn confirm(&self, call: &ToolCall) -> ConfirmationResponse {
        let (tx, rx) = oneshot::channel();
        let request = ConfirmationRequest {
            call: call.clone(),
            prompt: format!("Are you sure you want to run {}?", call.signature()),
            responder: tx,
        };
        if self.requests.send(request).await.is_err() {
            debug!(target: "confirmation", tool = %call.name, "Confirmation channel closed");
            return ConfirmationResponse::Denied;
        }
        rx.await.unwrap_or(ConfirmationResponse::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_affirmatives_approve() {
        for yes in ["yes", "Yes.", "  sure ", "Go ahead!", "do it", "Y"] {
            assert!(is_affirmative(yes), "{yes}");
        }
        for no in ["no", "", "maybe", "yes please delete nothing", "nope", "later"] {
            assert!(!is_affirmative(no), "{no}");
        }
    }

    #[tokio::test]
    async fn dropped_request_is_denied() {
        let (confirmer, mut rx) = ChannelConfirmer::new(1);
        let call = ToolCall::new("delete_file", Default::default());
        let answer = tokio::spawn(async move { confirmer.confirm(&call).await });
        let request = rx.recv().await.unwrap();
        drop(request);
        assert_eq!(answer.await.unwrap(), ConfirmationResponse::Denied);
    }

    #[tokio::test]
    async fn text_reply_resolves_request() {
        let (confirmer, mut rx) = ChannelConfirmer::new(1);
        let call = ToolCall::new("delete_file", Default::default());
        let answer = tokio::spawn(async move { confirmer.confirm(&call).await });
        let request = rx.recv().await.unwrap();
        assert!(request.prompt.contains("delete_file"));
        request.respond("yes");
        assert_eq!(answer.await.unwrap(), ConfirmationResponse::Approved);
    }
}
