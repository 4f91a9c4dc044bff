use std::fmt::Display;

use rand::{seq::SliceRandom, Rng};

use crate::error::TrackerError;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>?/~";
/// Characters easy to mistake for one another.
const AMBIGUOUS: &str = "Il1O0o";

pub const MIN_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct PasswordOptions {
    pub length: usize,
    pub upper: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 16,
            upper: true,
            digits: true,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    /// Enabled character classes. Lowercase letters are always on.
    fn classes(&self) -> Vec<Vec<char>> {
        [
            (true, LOWER),
            (self.upper, UPPER),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, class)| {
            class
                .chars()
                .filter(|v| !self.exclude_ambiguous || !AMBIGUOUS.contains(*v))
                .collect()
        })
        .collect()
    }

    /// Size of the alphabet a password is drawn from.
    pub fn pool_size(&self) -> usize {
        self.classes().iter().map(Vec::len).sum()
    }
}

/// Generates a password holding at least one character of every enabled class.
pub fn generate(options: &PasswordOptions, rng: &mut impl Rng) -> Result<String, TrackerError> {
    let classes = options.classes();
    let minimum = MIN_LENGTH.max(classes.len());
    if options.length < minimum {
        return Err(TrackerError::invalid(
            "length",
            format!("should be at least {minimum}"),
        ));
    }

    let pool = classes.iter().flatten().copied().collect::<Vec<_>>();
    let mut password = classes
        .iter()
        .filter_map(|class| class.choose(rng).copied())
        .collect::<Vec<_>>();
    while password.len() < options.length {
        password.push(pool[rng.gen_range(0..pool.len())]);
    }
    password.shuffle(rng);
    Ok(password.into_iter().collect())
}

pub fn entropy_bits(length: usize, pool: usize) -> f64 {
    if pool == 0 {
        return 0.;
    }
    length as f64 * (pool as f64).log2()
}

/// Estimate for an existing password based on the character classes it uses.
pub fn estimate_entropy(password: &str) -> f64 {
    let has = |class: &str| password.chars().any(|v| class.contains(v));
    let mut pool = [LOWER, UPPER, DIGITS, SYMBOLS]
        .into_iter()
        .filter(|v| has(v))
        .map(str::len)
        .sum::<usize>();
    if password
        .chars()
        .any(|v| !LOWER.contains(v) && !UPPER.contains(v) && !DIGITS.contains(v) && !SYMBOLS.contains(v))
    {
        // spaces and anything outside ASCII classes
        pool += 32;
    }
    entropy_bits(password.chars().count(), pool)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn from_bits(bits: f64) -> Self {
        if bits < 40. {
            Strength::Weak
        } else if bits < 60. {
            Strength::Fair
        } else if bits < 80. {
            Strength::Strong
        } else {
            Strength::VeryStrong
        }
    }
}

impl Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Weak => write!(f, "weak"),
            Strength::Fair => write!(f, "fair"),
            Strength::Strong => write!(f, "strong"),
            Strength::VeryStrong => write!(f, "very strong"),
        }
    }
}

/// Joins `words` random words from [WORDS].
pub fn passphrase(
    words: usize,
    separator: &str,
    rng: &mut impl Rng,
) -> Result<String, TrackerError> {
    if words == 0 {
        return Err(TrackerError::invalid("word count", "should be at least 1"));
    }
    let picked = (0..words)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>();
    Ok(picked.join(separator))
}

pub fn passphrase_entropy(words: usize) -> f64 {
    entropy_bits(words, WORDS.len())
}

pub const WORDS: &[&str] = &[
    "acorn", "adobe", "agent", "alarm", "album", "alley", "amber", "anchor", "angle", "ankle",
    "apple", "apron", "arena", "arrow", "aspen", "atlas", "attic", "award", "bacon", "badge",
    "bagel", "baker", "bamboo", "banjo", "barn", "basil", "basin", "beach", "beacon", "bench",
    "berry", "bison", "blade", "blank", "blaze", "bloom", "board", "bonus", "boots", "brick",
    "bridge", "brook", "broom", "brush", "bucket", "bugle", "cabin", "cable", "cactus", "camel",
    "candle", "canoe", "canyon", "cargo", "carpet", "castle", "cedar", "chalk", "charm", "cherry",
    "chess", "cider", "cinema", "circle", "citrus", "clock", "cloud", "clover", "coast", "cobalt",
    "cocoa", "comet", "coral", "cotton", "crane", "crater", "crown", "crystal", "cube", "dagger",
    "daisy", "delta", "denim", "desert", "diary", "dingo", "dolphin", "domino", "donut", "dragon",
    "drum", "dune", "eagle", "easel", "echo", "eclipse", "elbow", "ember", "engine", "falcon",
    "feather", "fern", "ferry", "fiddle", "flame", "flint", "forest", "fossil", "fox", "frost",
    "galaxy", "garden", "garlic", "gecko", "geyser", "ginger", "glacier", "globe", "granite",
    "grape", "gravel", "guitar", "hammer", "harbor", "harp", "hazel", "helmet", "heron", "hollow",
    "honey", "horizon", "husky", "igloo", "indigo", "island", "ivory", "jacket", "jaguar", "jasmine",
    "jelly", "jungle", "kayak", "kettle", "kiwi", "koala", "ladder", "lagoon", "lantern", "lava",
    "lemon", "lilac", "linen", "lizard", "lobster", "locket", "lotus", "magnet", "mango", "maple",
    "marble", "meadow", "melon", "meteor", "mint", "mirror", "mitten", "monsoon", "mosaic", "moss",
    "mustard", "nectar", "needle", "nickel", "noodle", "nutmeg", "oasis", "ocean", "olive", "onion",
    "opal", "orbit", "orchid", "otter", "oyster", "paddle", "palace", "panda", "paper", "parrot",
    "pebble", "pepper", "piano", "pillow", "pine", "pixel", "planet", "plum", "polar", "pond",
    "poppy", "prism", "pumpkin", "puzzle", "quartz", "quill", "rabbit", "radar", "raven", "reef",
    "ribbon", "river", "robin", "rocket", "saddle", "saffron", "salmon", "satin", "scarf", "shadow",
    "shell", "silver", "sketch", "slate", "sparrow", "spruce", "squid", "stone", "storm", "summit",
    "sunset", "swan", "tablet", "tango", "thistle", "thunder", "tiger", "timber", "toast", "topaz",
    "torch", "tulip", "tundra", "turtle", "umbrella", "valley", "velvet", "violet", "walnut",
    "walrus", "willow", "window", "winter", "yarn", "zebra",
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::{
        estimate_entropy, generate, passphrase, passphrase_entropy, PasswordOptions, Strength,
        AMBIGUOUS, DIGITS, SYMBOLS, UPPER, WORDS,
    };

    #[test]
    fn test_every_class_is_present() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let password = generate(
                &PasswordOptions {
                    length: 4,
                    ..Default::default()
                },
                &mut rng,
            )
            .unwrap();
            assert_eq!(password.chars().count(), 4);
            assert!(password.chars().any(|v| v.is_ascii_lowercase()));
            assert!(password.chars().any(|v| UPPER.contains(v)));
            assert!(password.chars().any(|v| DIGITS.contains(v)));
            assert!(password.chars().any(|v| SYMBOLS.contains(v)));
        }
    }

    #[test]
    fn test_disabled_classes_and_ambiguous() {
        let mut rng = StdRng::seed_from_u64(1);
        let options = PasswordOptions {
            length: 64,
            upper: false,
            symbols: false,
            exclude_ambiguous: true,
            ..Default::default()
        };
        let password = generate(&options, &mut rng).unwrap();
        assert!(password
            .chars()
            .all(|v| v.is_ascii_lowercase() || v.is_ascii_digit()));
        assert!(!password.chars().any(|v| AMBIGUOUS.contains(v)));
        assert_eq!(options.pool_size(), 24 + 8);
    }

    #[test]
    fn test_too_short() {
        let mut rng = StdRng::seed_from_u64(1);
        let options = PasswordOptions {
            length: 3,
            ..Default::default()
        };
        assert!(generate(&options, &mut rng).is_err());
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(Strength::from_bits(39.9), Strength::Weak);
        assert_eq!(Strength::from_bits(40.), Strength::Fair);
        assert_eq!(Strength::from_bits(79.), Strength::Strong);
        assert_eq!(Strength::from_bits(128.), Strength::VeryStrong);
        assert_eq!(Strength::VeryStrong.to_string(), "very strong");
    }

    #[test]
    fn test_estimate_entropy() {
        assert_eq!(estimate_entropy(""), 0.);
        // 8 lowercase letters, pool of 26
        let bits = estimate_entropy("password");
        assert!((bits - 8. * 26f64.log2()).abs() < 1e-9);
        assert!(estimate_entropy("Password1!") > bits);
    }

    #[test]
    fn test_passphrase() {
        let mut rng = StdRng::seed_from_u64(3);
        let phrase = passphrase(5, "-", &mut rng).unwrap();
        let words = phrase.split('-').collect::<Vec<_>>();
        assert_eq!(words.len(), 5);
        assert!(words.iter().all(|v| WORDS.contains(v)));
        assert!(passphrase(0, "-", &mut rng).is_err());
        assert!((passphrase_entropy(1) - (WORDS.len() as f64).log2()).abs() < 1e-9);
    }

    #[test]
    fn test_word_list_is_unique() {
        let unique = WORDS.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), WORDS.len());
        assert!(WORDS.iter().all(|v| !v.contains(char::is_whitespace)));
    }
}
