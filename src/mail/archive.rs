use mail_parser::{Address, HeaderValue};

use super::message::Message;
use crate::config::Config;

/// If the message went to a list we know an archive for, add a header
/// linking straight to it.
///
/// Needs the identifier header. The first recipient (To before Cc) that maps
/// to an archive list wins; at most one link is added.
pub fn add_archive_link_header(message: &mut Message, config: &Config) {
    let Some(id) = message
        .find(&config.headers.message_id)
        .map(|h| strip_message_id(h.value()).to_string())
    else {
        return;
    };
    if id.is_empty() {
        return;
    }

    let recipients = recipient_addresses(message, &config.headers.recipients);
    let Some(list) = recipients
        .iter()
        .find_map(|addr| config.archive.list_for(addr))
    else {
        tracing::debug!(recipients = recipients.len(), "no archived list among recipients");
        return;
    };

    let link = config.archive.link(&list, &id);
    tracing::debug!(list = %list, link = %link, "adding archive link");
    message.append(&config.headers.archive_uri, &link);
}

/// `<foo@bar.com>` -> `foo@bar.com`
pub fn strip_message_id(value: &str) -> &str {
    let s = value.trim();
    let s = s.strip_prefix('<').unwrap_or(s);
    let s = s.strip_suffix('>').unwrap_or(s);
    s.trim()
}

/// Every address in the named recipient headers, in header order.
///
/// Parsing is left to mail-parser so quoted display names, groups and
/// encoded words are handled properly. All headers are fed to it as `To` so
/// any configured header name gets address parsing.
pub fn recipient_addresses(message: &Message, names: &[String]) -> Vec<String> {
    let mut block = String::new();
    for name in names {
        for header in message.find_all(name) {
            block.push_str("To: ");
            block.push_str(header.value());
            block.push_str("\r\n");
        }
    }
    if block.is_empty() {
        return Vec::new();
    }
    block.push_str("\r\n");

    let Some(parsed) = mail_parser::MessageParser::default().parse(block.as_bytes()) else {
        return Vec::new();
    };

    parsed
        .headers()
        .iter()
        .flat_map(|header| addresses_in(&header.value))
        .collect()
}

fn addresses_in(value: &HeaderValue<'_>) -> Vec<String> {
    let addrs: Vec<_> = match value {
        HeaderValue::Address(Address::List(list)) => list.iter().collect(),
        HeaderValue::Address(Address::Group(groups)) => {
            groups.iter().flat_map(|g| g.addresses.iter()).collect()
        }
        _ => return Vec::new(),
    };

    addrs
        .into_iter()
        .filter_map(|a| a.address.as_deref())
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}
