pub mod archive;
pub mod date;
pub mod error;
pub mod message;

pub use archive::{add_archive_link_header, recipient_addresses, strip_message_id};
pub use date::{add_local_date_header, convert_date, local_date_value};
pub use error::FilterError;
pub use message::{Header, LINE_ENDING, Message};

use crate::config::Config;

/// Run the whole display filter over one raw message: add the local date,
/// add the archive link, then hide the identifier header.
pub fn transform(raw: &[u8], config: &Config) -> Result<Vec<u8>, FilterError> {
    let mut message = Message::parse(raw)?;

    add_local_date_header(&mut message, &config.headers);
    add_archive_link_header(&mut message, config);

    let removed = message.remove_all(&config.headers.message_id);
    tracing::trace!(removed, headers = message.headers().len(), "transformed message");

    Ok(message.to_bytes())
}
