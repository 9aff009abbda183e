//! Function-name mangling: template keys to canonical registry names.

/// Key prefix marking a single-key object as an extrinsic node.
pub const FUNC_PREFIX: &str = "CFPP::";

/// Convert a mixed-case operation name to its canonical snake-case form.
///
/// The `::` namespace separator is preserved verbatim. A word-boundary
/// underscore is inserted before an uppercase letter when it follows a
/// lowercase letter or digit, or when it ends a run of capitals and the next
/// letter is lowercase. The whole result is lower-cased.
///
/// ```
/// use cfpp_eval::mangle;
/// assert_eq!(mangle("KMS::EncryptFile"), "kms::encrypt_file");
/// assert_eq!(mangle("MimeMultipart"), "mime_multipart");
/// ```
pub fn mangle(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let after_word = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let ends_capital_run = prev.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
            if after_word || ends_capital_run {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}
