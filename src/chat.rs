//! Chat session with the oracle.
//!
//! The session owns the transcript and a pending flag. [`ChatSession::send`]
//! spawns a single oracle call on the tokio runtime and returns immediately;
//! the reply travels back over a channel and is appended by
//! [`ChatSession::poll`], which the frame loop calls once per frame.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::OracleError;
use crate::i18n::Language;
use crate::oracle::{consult, ChatBackend, Message, OracleFailure, OracleRequest, Role};

type Reply = Result<String, OracleFailure>;

/// Why a message was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Input was empty or whitespace.
    Blank,
    /// A previous message is still awaiting its reply.
    Pending,
}

/// Transcript plus the in-flight oracle call, if any.
pub struct ChatSession<B: ChatBackend> {
    backend: Arc<B>,
    runtime: Handle,
    language: Language,
    messages: Vec<Message>,
    next_id: u64,
    pending: bool,
    task: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Reply>,
    rx: mpsc::UnboundedReceiver<Reply>,
}

impl<B: ChatBackend> ChatSession<B> {
    /// A session opened by the localized greeting.
    pub fn new(backend: B, runtime: Handle, language: Language) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(backend),
            runtime,
            language,
            messages: vec![Message::new(0, Role::Model, language.labels().chat_greeting)],
            next_id: 1,
            pending: false,
            task: None,
            tx,
            rx,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Switch language; the greeting follows while nothing else was said.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let [greeting] = self.messages.as_mut_slice() {
            greeting.text = language.labels().chat_greeting.to_string();
        }
    }

    /// Append the user's message and start the oracle call.
    pub fn send(&mut self, input: &str) -> Result<(), Refusal> {
        let text = input.trim();
        if text.is_empty() {
            return Err(Refusal::Blank);
        }
        if self.pending {
            return Err(Refusal::Pending);
        }

        // The greeting is canned UI text the model never produced, so it is
        // left out of the history the model is shown.
        let request = OracleRequest {
            history: self.messages[1..].to_vec(),
            message: text.to_string(),
            language: self.language,
        };
        self.push(Role::User, text.to_string());
        self.pending = true;

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.task = Some(self.runtime.spawn(async move {
            let reply = consult(backend.as_ref(), request).await;
            // Receiver gone means the session was dropped.
            let _ = tx.send(reply);
        }));
        Ok(())
    }

    /// Append any reply that has landed. Returns `true` if one did.
    pub fn poll(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(reply) => {
                self.land(reply);
                true
            }
            Err(_) => {
                // Task ended without replying (panicked or aborted).
                if self.pending && self.task.as_ref().is_some_and(|t| t.is_finished()) {
                    if let Ok(reply) = self.rx.try_recv() {
                        self.land(reply);
                    } else {
                        self.land(Err(OracleFailure::new(
                            self.language,
                            OracleError::Cancelled,
                        )));
                    }
                    return true;
                }
                false
            }
        }
    }

    /// Wait for the in-flight reply, if any, and append it.
    pub async fn settle(&mut self) {
        if !self.pending {
            return;
        }
        let reply = match self.rx.recv().await {
            Some(reply) => reply,
            None => Err(OracleFailure::new(self.language, OracleError::Cancelled)),
        };
        self.land(reply);
    }

    fn land(&mut self, reply: Reply) {
        self.pending = false;
        self.task = None;
        let text = match reply {
            Ok(text) => text,
            Err(failure) => {
                tracing::warn!(error = %failure.error, "oracle call failed");
                failure.fallback.to_string()
            }
        };
        self.push(Role::Model, text);
    }

    fn push(&mut self, role: Role, text: String) {
        self.messages.push(Message::new(self.next_id, role, text));
        self.next_id += 1;
    }
}

impl<B: ChatBackend> Drop for ChatSession<B> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<B: ChatBackend> std::fmt::Debug for ChatSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("language", &self.language)
            .field("messages", &self.messages.len())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<usize>>,
    }

    impl ChatBackend for Echo {
        async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.history.len());
            }
            Ok(format!("echo: {}", request.message))
        }
    }

    struct Down;

    impl ChatBackend for Down {
        async fn generate(&self, _request: OracleRequest) -> Result<String, OracleError> {
            Err(OracleError::MissingApiKey)
        }
    }

    #[tokio::test]
    async fn test_greeting_and_relocalization() {
        let mut chat = ChatSession::new(Echo::default(), Handle::current(), Language::Zh);
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, Role::Model);
        assert!(chat.messages()[0].text.starts_with("我是 Aetheria"));

        chat.set_language(Language::En);
        assert!(chat.messages()[0].text.starts_with("I am Aetheria"));

        chat.send("hi").unwrap();
        chat.settle().await;
        chat.set_language(Language::Zh);
        assert!(chat.messages()[0].text.starts_with("I am Aetheria"));
    }

    #[tokio::test]
    async fn test_send_and_reply() {
        let mut chat = ChatSession::new(Echo::default(), Handle::current(), Language::En);
        chat.send("  Do you feel pain?  ").unwrap();
        assert!(chat.is_pending());
        assert_eq!(chat.messages()[1].text, "Do you feel pain?");

        chat.settle().await;
        assert!(!chat.is_pending());
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[2].role, Role::Model);
        assert_eq!(chat.messages()[2].text, "echo: Do you feel pain?");

        chat.send("again").unwrap();
        chat.settle().await;
        // Greeting excluded; first call saw no history, second saw two turns
        assert_eq!(*chat.backend.seen.lock().unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_refusals() {
        let mut chat = ChatSession::new(Echo::default(), Handle::current(), Language::En);
        assert_eq!(chat.send("   "), Err(Refusal::Blank));
        chat.send("one").unwrap();
        assert_eq!(chat.send("two"), Err(Refusal::Pending));
        assert_eq!(chat.messages().len(), 2);
        chat.settle().await;
        assert!(chat.send("two").is_ok());
    }

    #[tokio::test]
    async fn test_failure_shows_fallback_and_clears_pending() {
        let mut chat = ChatSession::new(Down, Handle::current(), Language::Zh);
        chat.send("你好").unwrap();
        chat.settle().await;
        assert!(!chat.is_pending());
        assert_eq!(
            chat.messages().last().unwrap().text,
            "熵扰乱了连接。请检查您的 API 密钥。"
        );
    }

    #[tokio::test]
    async fn test_poll_delivers_without_blocking() {
        let mut chat = ChatSession::new(Echo::default(), Handle::current(), Language::En);
        assert!(!chat.poll());
        chat.send("ping").unwrap();
        let mut delivered = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if chat.poll() {
                delivered = true;
                break;
            }
        }
        assert!(delivered);
        assert!(!chat.is_pending());
    }
}
