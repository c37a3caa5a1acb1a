//! Prompt rendering.
//!
//! Command templates carry a single placeholder token that is replaced with
//! the caller's argument text. There is no escaping and no nesting: any other
//! text, including other `{{...}}` markers, passes through untouched.

/// Placeholder token replaced by the argument text.
pub const PLACEHOLDER: &str = "{{args}}";

/// Substitute every occurrence of [`PLACEHOLDER`] in `template`.
///
/// The substitution is a single pass, so placeholders appearing inside
/// `args` are not expanded again.
pub fn render(template: &str, args: &str) -> String {
    template.replace(PLACEHOLDER, args)
}
