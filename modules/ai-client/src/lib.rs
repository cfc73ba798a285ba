pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::{AiError, AiResult};
pub use openai::OpenAi;
pub use traits::{ChatCompletion, Message, MessageRole};
pub use util::{redact_secret, truncate_to_char_boundary};
