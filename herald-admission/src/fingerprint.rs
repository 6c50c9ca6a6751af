use herald_common::Message;
use sha2::{Digest, Sha256};

/// Deterministic digest of a message's content, as lowercase hex SHA-256.
///
/// Recipients are sorted before hashing so that the same logical message
/// always maps to the same fingerprint whatever order its recipients were
/// given in. Subject and body are hashed verbatim.
///
/// Every field is preceded by its big-endian `u64` length, and the recipient
/// list by its count, so no choice of separators inside a field can make two
/// different messages hash the same input.
pub fn fingerprint(message: &Message) -> String {
    let recipients = message.sorted_recipients();

    let mut hasher = Sha256::new();
    hasher.update((recipients.len() as u64).to_be_bytes());
    for recipient in recipients {
        update_field(&mut hasher, recipient);
    }
    update_field(&mut hasher, message.subject());
    update_field(&mut hasher, message.body());

    format!("{:x}", hasher.finalize())
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}
