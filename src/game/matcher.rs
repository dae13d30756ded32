//! Guess Matching
//!
//! Lenient keyword heuristic deciding whether a chat guess hits the prompt.
//! Pure: no state, no failure modes.

/// Prompt words shorter than this are ignored ("a", "on", ...).
pub const MIN_KEYWORD_LEN: usize = 3;

/// Decide whether `guess` matches `prompt`.
///
/// Both sides are lowercased. A guess is correct when it equals the whole
/// prompt, or when it contains any prompt word of at least
/// [`MIN_KEYWORD_LEN`] characters as a substring. Substring, not word
/// boundary: "cats" and "bobcat" both hit "cat".
///
/// ```
/// use livesketch::game::matcher::is_correct;
///
/// assert!(is_correct("Cat sleeping on a windowsill", "cat"));
/// assert!(!is_correct("Dragon breathing fire", "xyz"));
/// ```
pub fn is_correct(prompt: &str, guess: &str) -> bool {
    let prompt = prompt.to_lowercase();
    let guess = guess.to_lowercase();

    if guess == prompt {
        return true;
    }

    // Bound first: the iterator borrows `prompt` and must drop before it
    let hit = keywords(&prompt).any(|keyword| guess.contains(keyword));
    hit
}

/// Prompt words long enough to count as keywords.
///
/// Length is measured in characters, not bytes.
pub fn keywords(prompt: &str) -> impl Iterator<Item = &str> {
    prompt
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
}
