//! Text cleanup before local synthesis
//!
//! VITS voices read raw digits and symbols poorly, so utterances are
//! rewritten into plain words first. Matching is per whitespace-separated
//! token; substrings inside longer words are left alone.

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Mr.", "Mister"),
    ("Mrs.", "Misses"),
    ("Ms.", "Miss"),
    ("Dr.", "Doctor"),
    ("Prof.", "Professor"),
    ("Jr.", "Junior"),
    ("Sr.", "Senior"),
    ("vs.", "versus"),
    ("etc.", "etcetera"),
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("approx.", "approximately"),
    ("govt.", "government"),
    ("dept.", "department"),
    ("vol.", "volume"),
    ("hrs.", "hours"),
    ("mins.", "minutes"),
    ("secs.", "seconds"),
    ("lbs.", "pounds"),
    ("km.", "kilometers"),
];

const SYMBOLS: &[(char, &str)] = &[
    ('&', "and"),
    ('%', "percent"),
    ('@', "at"),
    ('#', "number"),
    ('$', "dollars"),
    ('€', "euros"),
    ('£', "pounds"),
    ('+', "plus"),
    ('=', "equals"),
];

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Rewrite `text` so a speech model can read it aloud
pub fn normalize_for_speech(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len());
    for c in text.chars() {
        match SYMBOLS.iter().find(|(symbol, _)| *symbol == c) {
            Some((_, word)) => {
                spaced.push(' ');
                spaced.push_str(word);
                spaced.push(' ');
            }
            None => spaced.push(c),
        }
    }

    let words: Vec<String> = spaced.split_whitespace().map(expand_word).collect();

    words
        .join(" ")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,!?;:'-\"".contains(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn expand_word(word: &str) -> String {
    let core = word.trim_end_matches([',', '!', '?', ';', ')', '"']);
    let tail = &word[core.len()..];

    if let Some((_, expansion)) = ABBREVIATIONS.iter().find(|(abbrev, _)| *abbrev == core) {
        return format!("{}{}", expansion, tail);
    }

    let (stem, dot) = match core.strip_suffix('.') {
        Some(stem) => (stem, "."),
        None => (core, ""),
    };

    if let Some(words) = ordinal_words(stem).or_else(|| clock_words(stem)) {
        return format!("{}{}{}", words, dot, tail);
    }

    word.to_string()
}

/// Spell out 0..=999; larger numbers stay as digits
pub fn number_to_words(n: u32) -> Option<String> {
    match n {
        0..=19 => Some(ONES[n as usize].to_string()),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => Some(tens.to_string()),
                ones => Some(format!("{}-{}", tens, ONES[ones as usize])),
            }
        }
        100..=999 => {
            let hundreds = format!("{} hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => Some(hundreds),
                rest => Some(format!("{} {}", hundreds, number_to_words(rest)?)),
            }
        }
        _ => None,
    }
}

/// "21st" -> "twenty-first"
fn ordinal_words(token: &str) -> Option<String> {
    let suffix_at = token.find(|c: char| !c.is_ascii_digit())?;
    let (digits, suffix) = token.split_at(suffix_at);
    if digits.is_empty() || !matches!(suffix, "st" | "nd" | "rd" | "th") {
        return None;
    }

    let cardinal = number_to_words(digits.parse().ok()?)?;
    let split = cardinal.rfind([' ', '-']).map(|i| i + 1).unwrap_or(0);
    let (head, last) = cardinal.split_at(split);

    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        other if other.ends_with('y') => format!("{}ieth", &other[..other.len() - 1]),
        other => format!("{}th", other),
    };

    Some(format!("{}{}", head, last))
}

/// "3:30" -> "three thirty", "9:00" -> "nine o'clock"
fn clock_words(token: &str) -> Option<String> {
    let (hours, minutes) = token.split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }

    let hour = number_to_words(h)?;
    Some(match m {
        0 => format!("{} o'clock", hour),
        1..=9 => format!("{} oh {}", hour, number_to_words(m)?),
        _ => format!("{} {}", hour, number_to_words(m)?),
    })
}
