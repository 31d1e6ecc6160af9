//! Dialplan naming conventions and protocol constants

/// Prefix of every IVR menu context (`ivr_<id>`)
pub const IVR_CONTEXT_PREFIX: &str = "ivr_";

/// Prefix of every announcement context (`announcement_<id>`)
pub const ANNOUNCEMENT_CONTEXT_PREFIX: &str = "announcement_";

/// Start extension of every generated entity context
pub const START_EXTEN: &str = "s";

/// Extension an IVR exposes so nested announcements can hand the caller back
pub const RETURN_EXTEN: &str = "return";

/// Channel variable an IVR sets (inherited) so announcements can find it again
pub const IVR_CONTEXT_VAR: &str = "IVR_CONTEXT";

/// `^`-delimited `context^exten^priority` fax destination
pub const FAX_DEST_VAR: &str = "FAX_DEST";

/// Tone played when a menu has no invalid/timeout recording configured
pub const DEFAULT_TONE: &str = "beep";

/// Voicemail context used for IVR voicemail entries
pub const VOICEMAIL_CONTEXT: &str = "default";

/// Default Asterisk Manager Interface port
pub const DEFAULT_AMI_PORT: u16 = 5038;

/// Connection and response timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Socket buffer size for reading from the manager connection
pub const SOCKET_BUF_SIZE: usize = 8192;

/// Initial allocation and growth increment of the receive buffer
pub const BUF_CHUNK: usize = 16 * 1024;

/// Maximum accumulated receive buffer before the session is considered desynced
pub const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Manager message terminators
pub const MESSAGE_TERMINATOR: &str = "\r\n\r\n";
pub const LINE_TERMINATOR: &str = "\r\n";

/// Banner prefix sent by Asterisk on connect
pub const AMI_BANNER_PREFIX: &str = "Asterisk Call Manager";

/// Header names
pub const HEADER_RESPONSE: &str = "Response";
pub const HEADER_EVENT: &str = "Event";
pub const HEADER_ACTION: &str = "Action";
pub const HEADER_ACTION_ID: &str = "ActionID";
pub const HEADER_MESSAGE: &str = "Message";
pub const HEADER_OUTPUT: &str = "Output";

/// Maximum number of queued events kept while waiting for a response
pub const MAX_EVENT_QUEUE_SIZE: usize = 1000;

/// Seconds an announcement waits for its repeat digit after playback
pub const REPEAT_RESPONSE_TIMEOUT: u32 = 5;
