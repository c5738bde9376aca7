//! Romaji to hiragana composition for the kana mode.
//!
//! Keys accumulate as pending romaji until they spell a syllable; the
//! syllable is then committed as kana. While romaji is pending the input is
//! "composing", which is what the session uses to hold back scoring.

#[rustfmt::skip]
const TABLE: &[(&str, &str)] = &[
    ("a", "あ"), ("i", "い"), ("u", "う"), ("e", "え"), ("o", "お"),
    ("ka", "か"), ("ki", "き"), ("ku", "く"), ("ke", "け"), ("ko", "こ"),
    ("sa", "さ"), ("si", "し"), ("shi", "し"), ("su", "す"), ("se", "せ"), ("so", "そ"),
    ("ta", "た"), ("ti", "ち"), ("chi", "ち"), ("tu", "つ"), ("tsu", "つ"), ("te", "て"), ("to", "と"),
    ("na", "な"), ("ni", "に"), ("nu", "ぬ"), ("ne", "ね"), ("no", "の"),
    ("ha", "は"), ("hi", "ひ"), ("hu", "ふ"), ("fu", "ふ"), ("he", "へ"), ("ho", "ほ"),
    ("ma", "ま"), ("mi", "み"), ("mu", "む"), ("me", "め"), ("mo", "も"),
    ("ya", "や"), ("yu", "ゆ"), ("yo", "よ"),
    ("ra", "ら"), ("ri", "り"), ("ru", "る"), ("re", "れ"), ("ro", "ろ"),
    ("wa", "わ"), ("wo", "を"), ("nn", "ん"), ("n'", "ん"), ("xn", "ん"),
    ("ga", "が"), ("gi", "ぎ"), ("gu", "ぐ"), ("ge", "げ"), ("go", "ご"),
    ("za", "ざ"), ("zi", "じ"), ("ji", "じ"), ("zu", "ず"), ("ze", "ぜ"), ("zo", "ぞ"),
    ("da", "だ"), ("di", "ぢ"), ("du", "づ"), ("de", "で"), ("do", "ど"),
    ("ba", "ば"), ("bi", "び"), ("bu", "ぶ"), ("be", "べ"), ("bo", "ぼ"),
    ("pa", "ぱ"), ("pi", "ぴ"), ("pu", "ぷ"), ("pe", "ぺ"), ("po", "ぽ"),
    ("kya", "きゃ"), ("kyu", "きゅ"), ("kyo", "きょ"),
    ("sya", "しゃ"), ("syu", "しゅ"), ("syo", "しょ"),
    ("sha", "しゃ"), ("shu", "しゅ"), ("she", "しぇ"), ("sho", "しょ"),
    ("tya", "ちゃ"), ("tyu", "ちゅ"), ("tyo", "ちょ"),
    ("cha", "ちゃ"), ("chu", "ちゅ"), ("che", "ちぇ"), ("cho", "ちょ"),
    ("nya", "にゃ"), ("nyu", "にゅ"), ("nyo", "にょ"),
    ("hya", "ひゃ"), ("hyu", "ひゅ"), ("hyo", "ひょ"),
    ("mya", "みゃ"), ("myu", "みゅ"), ("myo", "みょ"),
    ("rya", "りゃ"), ("ryu", "りゅ"), ("ryo", "りょ"),
    ("gya", "ぎゃ"), ("gyu", "ぎゅ"), ("gyo", "ぎょ"),
    ("ja", "じゃ"), ("ju", "じゅ"), ("je", "じぇ"), ("jo", "じょ"),
    ("zya", "じゃ"), ("zyu", "じゅ"), ("zyo", "じょ"),
    ("bya", "びゃ"), ("byu", "びゅ"), ("byo", "びょ"),
    ("pya", "ぴゃ"), ("pyu", "ぴゅ"), ("pyo", "ぴょ"),
    ("fa", "ふぁ"), ("fi", "ふぃ"), ("fe", "ふぇ"), ("fo", "ふぉ"),
    ("xa", "ぁ"), ("xi", "ぃ"), ("xu", "ぅ"), ("xe", "ぇ"), ("xo", "ぉ"),
    ("la", "ぁ"), ("li", "ぃ"), ("lu", "ぅ"), ("le", "ぇ"), ("lo", "ぉ"),
    ("xya", "ゃ"), ("xyu", "ゅ"), ("xyo", "ょ"),
    ("lya", "ゃ"), ("lyu", "ゅ"), ("lyo", "ょ"),
    ("xtu", "っ"), ("ltu", "っ"), ("xtsu", "っ"),
    ("-", "ー"), (",", "、"), (".", "。"), ("!", "！"), ("?", "？"),
];

fn lookup(romaji: &str) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(key, _)| *key == romaji)
        .map(|(_, kana)| *kana)
}

fn is_prefix(romaji: &str) -> bool {
    TABLE
        .iter()
        .any(|(key, _)| key.len() > romaji.len() && key.starts_with(romaji))
}

fn is_doubling_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !matches!(c, 'a' | 'i' | 'u' | 'e' | 'o' | 'n')
}

#[derive(Debug, Clone, Default)]
pub struct RomajiComposer {
    pending: String,
}

impl RomajiComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one key and returns whatever became committed kana.
    pub fn push(&mut self, c: char) -> String {
        self.pending.push(c.to_ascii_lowercase());
        let mut committed = String::new();

        while !self.pending.is_empty() {
            if let Some(kana) = lookup(&self.pending) {
                committed.push_str(kana);
                self.pending.clear();
                break;
            }
            if is_prefix(&self.pending) {
                break;
            }

            let mut chars = self.pending.chars();
            let (first, second) = match (chars.next(), chars.next()) {
                (Some(first), second) => (first, second),
                (None, _) => break,
            };
            match (first, second) {
                ('n', Some(_)) => committed.push('ん'),
                ('t', Some('c')) => committed.push('っ'),
                (f, Some(s)) if f == s && is_doubling_consonant(f) => committed.push('っ'),
                (raw, _) => committed.push(raw),
            }
            self.pending.replace_range(..first.len_utf8(), "");
        }

        committed
    }

    /// Drops the last pending key. Returns false when nothing was pending.
    pub fn backspace(&mut self) -> bool {
        self.pending.pop().is_some()
    }

    /// Commits whatever is pending as-is; a lone `n` becomes `ん`.
    pub fn flush(&mut self) -> String {
        let flushed = match self.pending.as_str() {
            "n" => "ん".to_string(),
            other => other.to_string(),
        };
        self.pending.clear();
        flushed
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn is_composing(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(keys: &str) -> (String, String) {
        let mut composer = RomajiComposer::new();
        let committed: String = keys.chars().map(|c| composer.push(c)).collect();
        (committed, composer.pending().to_string())
    }

    #[test]
    fn syllables_commit_kana() {
        assert_eq!(compose("neko"), ("ねこ".to_string(), String::new()));
        assert_eq!(compose("shinkansen"), ("しんかんせ".to_string(), "n".to_string()));
        assert_eq!(compose("kyou"), ("きょう".to_string(), String::new()));
    }

    #[test]
    fn pending_romaji_is_composing() {
        let mut composer = RomajiComposer::new();
        assert_eq!(composer.push('k'), "");
        assert!(composer.is_composing());
        assert_eq!(composer.push('a'), "か");
        assert!(!composer.is_composing());
    }

    #[test]
    fn doubled_consonant_commits_small_tsu() {
        assert_eq!(compose("kitte"), ("きって".to_string(), String::new()));
        assert_eq!(compose("matcha").0, "まっちゃ");
        let mut composer = RomajiComposer::new();
        composer.push('p');
        assert_eq!(composer.push('p'), "っ");
        assert_eq!(composer.pending(), "p");
    }

    #[test]
    fn n_before_consonant_is_syllabic() {
        assert_eq!(compose("honda"), ("ほんだ".to_string(), String::new()));
        assert_eq!(compose("nn"), ("ん".to_string(), String::new()));
        assert_eq!(compose("konnnichiha").0, "こんにちは");
    }

    #[test]
    fn punctuation_and_long_vowel() {
        assert_eq!(compose("ko-hi-."), ("こーひー。".to_string(), String::new()));
        assert_eq!(compose("a,i").0, "あ、い");
    }

    #[test]
    fn unknown_keys_pass_through() {
        assert_eq!(compose("q1"), ("q1".to_string(), String::new()));
        assert_eq!(compose("か").0, "か");
    }

    #[test]
    fn flush_and_backspace() {
        let mut composer = RomajiComposer::new();
        composer.push('h');
        composer.push('o');
        composer.push('n');
        assert_eq!(composer.flush(), "ん");
        assert!(!composer.is_composing());

        composer.push('s');
        composer.push('h');
        assert!(composer.backspace());
        assert_eq!(composer.pending(), "s");
        assert!(composer.backspace());
        assert!(!composer.backspace());
    }

    #[test]
    fn uppercase_is_folded() {
        assert_eq!(compose("KA").0, "か");
    }
}
