use rand::Rng;

/// Uppercase alphanumerics minus the glyphs that read alike on print (`0/O`, `1/I`).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 8;

/// Produces candidate codes. Uniqueness is enforced by the store, not here.
pub trait CodeSource: Send + Sync {
    fn candidate(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Canonical form of user-supplied input, or `None` if it cannot be a code.
///
/// Lookup is exact after trimming and upper-casing. Anything that is not
/// `CODE_LENGTH` ASCII alphanumerics never reaches the store.
#[must_use]
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(code)
}
