use herald_core::Attachment;
use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};

use crate::config::BodyMode;
use crate::error::EmailError;

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|source| EmailError::InvalidAddress {
            address: address.to_owned(),
            source,
        })
}

/// Build the sender mailbox from an address and optional display name.
pub(crate) fn sender(address: &str, name: Option<&str>) -> Result<Mailbox, EmailError> {
    let mailbox = parse_mailbox(address)?;
    Ok(Mailbox::new(name.map(str::to_owned), mailbox.email))
}

/// The addresses shared by every message of one send.
#[derive(Debug, Clone)]
pub(crate) struct Addresses {
    pub(crate) from: Mailbox,
    pub(crate) cc: Vec<Mailbox>,
    pub(crate) bcc: Vec<Mailbox>,
}

impl Addresses {
    pub(crate) fn parse(
        from: &str,
        sender_name: Option<&str>,
        cc: &[String],
        bcc: &[String],
    ) -> Result<Self, EmailError> {
        let parse_all = |list: &[String]| -> Result<Vec<Mailbox>, EmailError> {
            list.iter().map(|a| parse_mailbox(a)).collect()
        };
        Ok(Self {
            from: sender(from, sender_name)?,
            cc: parse_all(cc)?,
            bcc: parse_all(bcc)?,
        })
    }
}

fn body_part(body: &str, mode: BodyMode) -> SinglePart {
    match mode {
        BodyMode::Html => SinglePart::html(body.to_owned()),
        BodyMode::Text => SinglePart::plain(body.to_owned()),
    }
}

fn attachment_part(attachment: &Attachment) -> SinglePart {
    let content_type = ContentType::parse(attachment.content_type())
        .or_else(|_| ContentType::parse("application/octet-stream"))
        .unwrap_or(ContentType::TEXT_PLAIN);
    let builder = if attachment.is_inline() {
        MimeAttachment::new_inline(attachment.name().to_owned())
    } else {
        MimeAttachment::new(attachment.name().to_owned())
    };
    builder.body(attachment.data().to_vec(), content_type)
}

/// Assemble one message for a single recipient.
pub(crate) fn build(
    addresses: &Addresses,
    to: Mailbox,
    subject: &str,
    body: &str,
    mode: BodyMode,
    attachments: &[Attachment],
) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(addresses.from.clone())
        .to(to)
        .subject(subject);
    for cc in &addresses.cc {
        builder = builder.cc(cc.clone());
    }
    for bcc in &addresses.bcc {
        builder = builder.bcc(bcc.clone());
    }

    if attachments.is_empty() {
        return Ok(builder.singlepart(body_part(body, mode))?);
    }

    let mut mixed = MultiPart::mixed().singlepart(body_part(body, mode));
    for attachment in attachments {
        mixed = mixed.singlepart(attachment_part(attachment));
    }
    Ok(builder.multipart(mixed)?)
}
