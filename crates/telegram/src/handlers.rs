use std::sync::Arc;

use {
    fieldex_config::FilesConfig,
    fieldex_extract::{ExtractStats, extract_file},
    fieldex_sessions::{Error as SessionError, Session, SessionStore, parse_field_index},
    teloxide::types::{MediaKind, Message, MessageKind},
    tracing::{debug, error, info, warn},
};

use crate::{
    commands::Command,
    error::Result,
    replies,
    tempfiles::RequestFiles,
    transport::{OutgoingDocument, Transport},
};

/// Only uploads whose name ends with this suffix are processed.
pub const ACCEPTED_SUFFIX: &str = ".txt";

/// Prefix added to the uploaded file name for the result file.
pub const OUTPUT_PREFIX: &str = "extracted_";

/// An inbound message reduced to what the handlers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: u64,
    pub chat_id: i64,
    pub message_id: i32,
    pub content: InboundContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    Text(String),
    Document(DocumentInfo),
    /// Stickers, photos, and anything else we do not handle.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_id: String,
    pub file_name: Option<String>,
    pub size: u64,
}

impl Inbound {
    /// Convert a Telegram message. Returns `None` for messages without a
    /// sender (channel posts), which have no session to act on.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let user_id = msg.from.as_ref()?.id.0;
        let content = match &msg.kind {
            MessageKind::Common(common) => match &common.media_kind {
                MediaKind::Text(t) => InboundContent::Text(t.text.clone()),
                MediaKind::Document(d) => InboundContent::Document(DocumentInfo {
                    file_id: d.document.file.id.clone(),
                    file_name: d.document.file_name.clone(),
                    size: u64::from(d.document.file.size),
                }),
                _ => InboundContent::Other,
            },
            _ => InboundContent::Other,
        };
        Some(Self {
            user_id,
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
            content,
        })
    }
}

/// Outcome of a document that passed the upload checks.
enum Processed {
    NoMatches,
    Sent(ExtractStats),
}

/// Routes inbound messages to command and upload handlers.
pub struct CommandDispatcher {
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionStore>,
    files: FilesConfig,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionStore>,
        files: FilesConfig,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            transport,
            sessions,
            files,
            bot_username,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound message.
    ///
    /// Only transport failures while replying are returned; bad input and
    /// failed uploads are answered in the chat.
    pub async fn handle(&self, inbound: Inbound) -> Result<()> {
        match &inbound.content {
            InboundContent::Text(text) => {
                match Command::parse(text, self.bot_username.as_deref()) {
                    Some(command) => self.handle_command(&inbound, command).await,
                    None => self.reply(&inbound, &replies::fallback()).await,
                }
            },
            InboundContent::Document(doc) => self.handle_document(&inbound, doc).await,
            InboundContent::Other => self.reply(&inbound, &replies::fallback()).await,
        }
    }

    async fn handle_command(&self, inbound: &Inbound, command: Command) -> Result<()> {
        let user_id = inbound.user_id;
        debug!(user_id, ?command, "handling command");

        let text = match command {
            Command::Start => replies::welcome(&self.sessions.reset(user_id)),
            Command::Help => replies::help(),
            Command::Settings => replies::settings(&self.sessions.get(user_id)),
            Command::SetIndex(None) => replies::index_usage(),
            Command::SetIndex(Some(raw)) => {
                let applied = parse_field_index(&raw)
                    .map(|field_index| self.sessions.set_field_index(user_id, field_index));
                match applied {
                    Ok(session) => {
                        info!(user_id, field_index = session.field_index, "field index set");
                        replies::index_set(&session)
                    },
                    Err(SessionError::InvalidArgument(reason)) => {
                        debug!(user_id, %reason, "rejected field index");
                        replies::invalid_argument(&reason)
                    },
                }
            },
            Command::SetDelimiter(None) => replies::delimiter_usage(),
            Command::SetDelimiter(Some(raw)) => match self.sessions.set_delimiter(user_id, &raw) {
                Ok(session) => {
                    info!(user_id, delimiter = %session.delimiter, "delimiter set");
                    replies::delimiter_set(&session)
                },
                Err(SessionError::InvalidArgument(reason)) => replies::invalid_argument(&reason),
            },
        };

        self.reply(inbound, &text).await
    }

    async fn handle_document(&self, inbound: &Inbound, doc: &DocumentInfo) -> Result<()> {
        let user_id = inbound.user_id;
        let Some(file_name) = doc
            .file_name
            .as_deref()
            .filter(|name| name.ends_with(ACCEPTED_SUFFIX))
        else {
            debug!(user_id, file_name = ?doc.file_name, "rejected upload: not a .txt file");
            return self.reply(inbound, &replies::wrong_file_type()).await;
        };

        if doc.size > self.files.max_file_bytes {
            debug!(user_id, file_name, size = doc.size, "rejected upload: too large");
            return self
                .reply(
                    inbound,
                    &replies::file_too_large(doc.size, self.files.max_file_bytes),
                )
                .await;
        }

        let session = self.sessions.get(user_id);
        let placeholder = self
            .transport
            .send_text(inbound.chat_id, &replies::processing())
            .await?;

        info!(
            user_id,
            file_name,
            size = doc.size,
            field_index = session.field_index,
            delimiter = %session.delimiter,
            "processing upload"
        );

        let result = match RequestFiles::create(&self.files.temp_dir, user_id, inbound.message_id)
        {
            Ok(files) => {
                let result = self
                    .process_document(inbound, doc, file_name, &session, &files)
                    .await;
                if let Err(e) = files.close() {
                    warn!(user_id, error = %e, "failed to remove temp files");
                }
                result
            },
            Err(e) => Err(e.into()),
        };

        let followup = match result {
            Ok(Processed::Sent(stats)) => {
                info!(
                    user_id,
                    file_name,
                    written = stats.written,
                    lines_read = stats.lines_read,
                    "upload processed"
                );
                self.transport
                    .delete_message(inbound.chat_id, placeholder)
                    .await
            },
            Ok(Processed::NoMatches) => {
                info!(user_id, file_name, "upload produced no lines");
                self.transport
                    .edit_text(inbound.chat_id, placeholder, &replies::zero_matches())
                    .await
            },
            Err(e) => {
                error!(user_id, file_name, error = %e, error_debug = ?e, "error processing file");
                self.transport
                    .edit_text(inbound.chat_id, placeholder, &replies::failure(&e.to_string()))
                    .await
            },
        };

        if let Err(e) = followup {
            warn!(user_id, error = %e, "failed to update progress message");
        }
        Ok(())
    }

    async fn process_document(
        &self,
        inbound: &Inbound,
        doc: &DocumentInfo,
        file_name: &str,
        session: &Session,
        files: &RequestFiles,
    ) -> Result<Processed> {
        self.transport
            .download_file(&doc.file_id, files.input())
            .await?;

        let spec = session.field_spec();
        let input = files.input().to_path_buf();
        let output = files.output().to_path_buf();
        let stats =
            tokio::task::spawn_blocking(move || extract_file(&input, &output, &spec)).await??;

        if stats.is_empty() {
            return Ok(Processed::NoMatches);
        }

        let data = tokio::fs::read(files.output()).await?;
        self.transport
            .send_document(inbound.chat_id, OutgoingDocument {
                file_name: output_file_name(file_name),
                data,
                caption: Some(replies::done_caption(stats.written, session)),
            })
            .await?;
        Ok(Processed::Sent(stats))
    }

    async fn reply(&self, inbound: &Inbound, text: &str) -> Result<()> {
        self.transport.send_text(inbound.chat_id, text).await?;
        Ok(())
    }
}

/// Name of the result file for an upload called `original`.
pub fn output_file_name(original: &str) -> String {
    format!("{OUTPUT_PREFIX}{original}")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        serde_json::json,
        std::{
            io,
            path::{Path, PathBuf},
            sync::{
                Mutex,
                atomic::{AtomicI32, Ordering},
            },
        },
    };

    const CHAT: i64 = 42;
    const USER: u64 = 1001;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        SendText { text: String },
        EditText { message_id: i32, text: String },
        Delete { message_id: i32 },
        Download { file_id: String, dest: PathBuf },
        SendDocument(OutgoingDocument),
    }

    #[derive(Default)]
    struct MockTransport {
        calls: Mutex<Vec<Call>>,
        /// Content served for downloads; `None` makes downloads fail.
        file_content: Option<Vec<u8>>,
        next_id: AtomicI32,
    }

    impl MockTransport {
        fn serving(content: &str) -> Self {
            Self {
                file_content: Some(content.as_bytes().to_vec()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn texts(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::SendText { text } => Some(text),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send_text(&self, _chat_id: i64, text: &str) -> Result<i32> {
            self.record(Call::SendText {
                text: text.to_string(),
            });
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 100)
        }

        async fn edit_text(&self, _chat_id: i64, message_id: i32, text: &str) -> Result<()> {
            self.record(Call::EditText {
                message_id,
                text: text.to_string(),
            });
            Ok(())
        }

        async fn delete_message(&self, _chat_id: i64, message_id: i32) -> Result<()> {
            self.record(Call::Delete { message_id });
            Ok(())
        }

        async fn download_file(&self, file_id: &str, dest: &Path) -> Result<()> {
            self.record(Call::Download {
                file_id: file_id.to_string(),
                dest: dest.to_path_buf(),
            });
            match &self.file_content {
                Some(content) => {
                    tokio::fs::write(dest, content).await?;
                    Ok(())
                },
                None => Err(io::Error::other("download failed: file is gone").into()),
            }
        }

        async fn send_document(&self, _chat_id: i64, document: OutgoingDocument) -> Result<()> {
            self.record(Call::SendDocument(document));
            Ok(())
        }
    }

    fn dispatcher(transport: &Arc<MockTransport>, temp_dir: &Path) -> CommandDispatcher {
        let files = FilesConfig {
            temp_dir: temp_dir.to_path_buf(),
            max_file_bytes: 1024,
        };
        CommandDispatcher::new(
            Arc::clone(transport) as Arc<dyn Transport>,
            Arc::new(SessionStore::default()),
            files,
            Some("fieldex_bot".into()),
        )
    }

    fn text(body: &str) -> Inbound {
        Inbound {
            user_id: USER,
            chat_id: CHAT,
            message_id: 1,
            content: InboundContent::Text(body.to_string()),
        }
    }

    fn upload(file_name: Option<&str>, size: u64) -> Inbound {
        Inbound {
            user_id: USER,
            chat_id: CHAT,
            message_id: 7,
            content: InboundContent::Document(DocumentInfo {
                file_id: "file-1".into(),
                file_name: file_name.map(str::to_string),
                size,
            }),
        }
    }

    fn dir_entries(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn start_resets_session_and_welcomes() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());
        d.sessions().set_field_index(USER, 1);

        d.handle(text("/start")).await.unwrap();

        assert_eq!(d.sessions().get(USER), Session::default());
        let texts = transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("<code>5</code> (field #6)"));
    }

    #[tokio::test]
    async fn help_and_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(text("/help")).await.unwrap();
        d.handle(text("/settings")).await.unwrap();

        assert_eq!(transport.texts(), vec![
            replies::help(),
            replies::settings(&Session::default()),
        ]);
    }

    #[tokio::test]
    async fn set_index_applies_valid_value() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(text("/set_index 2")).await.unwrap();

        assert_eq!(d.sessions().get(USER).field_index, 2);
        assert!(transport.texts()[0].contains("<code>2</code> (field #3)"));
    }

    #[tokio::test]
    async fn set_index_rejects_bad_values_and_keeps_previous() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());
        d.handle(text("/set_index 3")).await.unwrap();

        d.handle(text("/set_index -1")).await.unwrap();
        d.handle(text("/set_index abc")).await.unwrap();
        d.handle(text("/set_index")).await.unwrap();
        d.handle(text("/set_index -99999999999999999999")).await.unwrap();

        assert_eq!(d.sessions().get(USER).field_index, 3);
        let texts = transport.texts();
        assert_eq!(texts[1], "❌ The index must be a non-negative number.");
        assert_eq!(texts[2], "❌ Not a valid number. Use an integer >= 0.");
        assert_eq!(texts[3], replies::index_usage());
        assert_eq!(texts[4], "❌ The index must be a non-negative number.");
    }

    #[tokio::test]
    async fn set_index_accepts_values_beyond_i64() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(text("/set_index 99999999999999999999")).await.unwrap();

        let session = d.sessions().get(USER);
        assert_eq!(session.field_index, usize::MAX);
        assert_eq!(transport.texts(), vec![replies::index_set(&session)]);
    }

    #[tokio::test]
    async fn set_delimiter_applies_and_requires_value() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(text("/set_delimiter |")).await.unwrap();
        d.handle(text("/set_delimiter")).await.unwrap();

        assert_eq!(d.sessions().get(USER).delimiter.as_str(), "|");
        let texts = transport.texts();
        assert_eq!(texts[0], "✅ Delimiter set: <code>|</code>");
        assert_eq!(texts[1], replies::delimiter_usage());
    }

    #[tokio::test]
    async fn unknown_input_gets_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(text("hello")).await.unwrap();
        d.handle(text("/unknown")).await.unwrap();
        d.handle(text("/help@other_bot")).await.unwrap();
        d.handle(Inbound {
            content: InboundContent::Other,
            ..text("")
        })
        .await
        .unwrap();

        assert_eq!(transport.texts(), vec![replies::fallback(); 4]);
    }

    #[tokio::test]
    async fn non_txt_upload_rejected_before_download() {
        let tmp = tempfile::tempdir().unwrap();
        let temp_dir = tmp.path().join("work");
        let transport = Arc::new(MockTransport::serving("a:b\n"));
        let d = dispatcher(&transport, &temp_dir);

        d.handle(upload(Some("data.csv"), 10)).await.unwrap();
        d.handle(upload(None, 10)).await.unwrap();

        assert_eq!(transport.calls(), vec![
            Call::SendText {
                text: replies::wrong_file_type()
            },
            Call::SendText {
                text: replies::wrong_file_type()
            },
        ]);
        assert!(!temp_dir.exists());
        assert!(d.sessions().is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_rejected_before_download() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::serving("a:b\n"));
        let d = dispatcher(&transport, tmp.path());

        d.handle(upload(Some("big.txt"), 4096)).await.unwrap();

        assert_eq!(transport.calls(), vec![Call::SendText {
            text: replies::file_too_large(4096, 1024)
        }]);
        assert_eq!(dir_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn upload_is_extracted_and_sent_back() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::serving("a:b:c\nx:y\n\n"));
        let d = dispatcher(&transport, tmp.path());
        d.sessions().set_field_index(USER, 1);

        d.handle(upload(Some("list.txt"), 12)).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 4, "{calls:?}");
        assert_eq!(calls[0], Call::SendText {
            text: replies::processing()
        });
        let Call::Download { file_id, dest } = &calls[1] else {
            panic!("expected download, got {:?}", calls[1]);
        };
        assert_eq!(file_id, "file-1");
        assert!(!dest.exists(), "temp input should be removed");
        let Call::SendDocument(doc) = &calls[2] else {
            panic!("expected document, got {:?}", calls[2]);
        };
        assert_eq!(doc.file_name, "extracted_list.txt");
        assert_eq!(doc.data, b"b\ny\n");
        assert!(doc.caption.as_deref().unwrap_or_default().contains("<b>2</b>"));
        assert_eq!(calls[3], Call::Delete { message_id: 100 });
        assert_eq!(dir_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn zero_matches_edits_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::serving("a:b:c\n"));
        let d = dispatcher(&transport, tmp.path());

        d.handle(upload(Some("list.txt"), 6)).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3, "{calls:?}");
        assert_eq!(calls[2], Call::EditText {
            message_id: 100,
            text: replies::zero_matches()
        });
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, Call::SendDocument(_)))
        );
        assert_eq!(dir_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn download_failure_is_reported_and_cleaned_up() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let d = dispatcher(&transport, tmp.path());

        d.handle(upload(Some("list.txt"), 6)).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3, "{calls:?}");
        assert_eq!(calls[2], Call::EditText {
            message_id: 100,
            text: replies::failure("download failed: file is gone")
        });
        assert_eq!(dir_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn upload_uses_sender_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::serving("tag1|tag2|tag3\n"));
        let d = dispatcher(&transport, tmp.path());
        d.sessions().set_field_index(USER, 2);
        d.sessions().set_delimiter(USER, "|").unwrap();
        d.sessions().set_field_index(USER + 1, 0);

        d.handle(upload(Some("tags.txt"), 15)).await.unwrap();

        let doc = transport
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::SendDocument(doc) => Some(doc),
                _ => None,
            })
            .unwrap();
        assert_eq!(doc.data, b"tag3\n");
    }

    #[test]
    fn output_name_is_prefixed() {
        assert_eq!(output_file_name("data.txt"), "extracted_data.txt");
    }

    #[test]
    fn inbound_from_text_message() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 5,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "text": "/settings"
        }))
        .unwrap();

        assert_eq!(
            Inbound::from_message(&msg),
            Some(Inbound {
                user_id: 1001,
                chat_id: 42,
                message_id: 5,
                content: InboundContent::Text("/settings".into()),
            })
        );
    }

    #[test]
    fn inbound_from_document_message() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 6,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "document": {
                "file_id": "BQACAgI",
                "file_unique_id": "AgAD",
                "file_name": "accounts.txt",
                "mime_type": "text/plain",
                "file_size": 2048
            }
        }))
        .unwrap();

        let inbound = Inbound::from_message(&msg).unwrap();

        assert_eq!(
            inbound.content,
            InboundContent::Document(DocumentInfo {
                file_id: "BQACAgI".into(),
                file_name: Some("accounts.txt".into()),
                size: 2048,
            })
        );
    }

    #[test]
    fn inbound_from_location_is_other() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 7,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "location": { "latitude": 48.8566, "longitude": 2.3522 }
        }))
        .unwrap();

        assert_eq!(
            Inbound::from_message(&msg).map(|i| i.content),
            Some(InboundContent::Other)
        );
    }
}
