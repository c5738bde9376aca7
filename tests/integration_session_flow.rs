use std::rc::Rc;

use assert_matches::assert_matches;

use flowtype::catalog::{GameOptions, Prompt, PromptLength, QuestionBank};
use flowtype::sequencer::PromptSequencer;
use flowtype::session::{InputOutcome, Keystroke, Session, TickOutcome};
use flowtype::timer::MockClock;
use flowtype::typing_policy::{InputMode, SessionPolicy};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn session(mode: InputMode, texts: &[&str]) -> (Session, Rc<MockClock>) {
    let clock = Rc::new(MockClock::new());
    let prompts = texts.iter().map(|t| Prompt::new(*t)).collect();
    let session = Session::new(mode, PromptSequencer::new(prompts), SessionPolicy::default())
        .unwrap()
        .with_clock(Rc::clone(&clock));
    (session, clock)
}

fn type_clean(session: &mut Session, text: &str) -> InputOutcome {
    let mut value = String::new();
    let mut outcome = InputOutcome::Ignored;
    for c in text.chars() {
        value.push(c);
        session.record_keystroke(Keystroke::Char(c), false);
        outcome = session.update_snapshot(&value);
    }
    outcome
}

fn type_with_fixed_typo(session: &mut Session, text: &str) -> InputOutcome {
    session.update_snapshot("#");
    session.update_snapshot("");
    type_clean(session, text)
}

#[test]
fn cat_scenario_scores_three_plus_precision() {
    let (mut s, _clock) = session(InputMode::English, &["cat", "dog"]);
    let outcome = type_clean(&mut s, "cat");
    assert_matches!(outcome, InputOutcome::PromptCompleted(_));
    assert_eq!(s.counters().correct, 3);
    assert_eq!(s.flow().streak(), 1);
    assert_eq!(s.flow().skill_points(), 3 + 5);
}

#[test]
fn threshold_fires_again_after_reset_and_regrow() {
    let texts = ["a"; 10];
    let (mut s, _clock) = session(InputMode::English, &texts);

    for _ in 0..5 {
        type_clean(&mut s, "a");
    }
    // reaching 4 and 5 does not re-award the streak-3 bonus
    assert_eq!(s.flow().bonus_secs_earned(), 5);

    type_with_fixed_typo(&mut s, "a");
    assert_eq!(s.flow().streak(), 0);

    for _ in 0..3 {
        type_clean(&mut s, "a");
    }
    assert_eq!(s.flow().bonus_secs_earned(), 10);
    assert_eq!(s.flow().max_streak(), 5);
    assert_eq!(s.remaining_secs(), 190);
}

#[test]
fn timer_expiry_mid_prompt_covers_bonus_time() {
    let (mut s, clock) = session(InputMode::English, &["a", "b", "c", "longer prompt"]);
    for text in ["a", "b", "c"] {
        type_clean(&mut s, text);
    }
    assert_eq!(s.remaining_secs(), 185);
    type_clean(&mut s, "long");

    let mut results = Vec::new();
    for _ in 0..300 {
        clock.advance_secs(1);
        if let TickOutcome::Finished(result) = s.tick() {
            results.push(result);
        }
    }
    assert_eq!(results.len(), 1);
    let result = results[0];
    assert_eq!(result.elapsed_seconds, 185);
    assert_eq!(result.flow.bonus_time_earned, 5);
    assert_eq!(result.correct_count, 3);

    // more typing after the end changes nothing
    assert_eq!(s.update_snapshot("longer"), InputOutcome::Ignored);
    assert_eq!(s.finish(), result);
}

#[test]
fn accuracy_stays_in_bounds_with_heavy_editing() {
    let (mut s, clock) = session(InputMode::Copy, &["fn main() {}", "let x = 1;"]);
    s.update_snapshot("fn   main");
    s.update_snapshot("fn   mian");
    s.update_snapshot("fn   ma");
    s.update_snapshot("fn main() {}");
    clock.advance_secs(20);
    let result = s.finish();

    let counters = s.counters();
    assert!(counters.correct <= counters.scoring_typed);
    assert!(counters.scoring_typed <= counters.total_typed);
    assert!(result.accuracy <= 100);
    assert_eq!(result.total_typed, counters.scoring_typed);
}

// Random appends, backspaces and whole-field replacements mixing code
// characters with whitespace.
fn random_edit(rng: &mut StdRng, value: &str) -> String {
    const ALPHABET: &[char] = &['f', 'n', 'm', 'a', 'i', '(', ')', ' ', ' ', '\t', '\n', '{'];
    let mut chars: Vec<char> = value.chars().collect();
    match rng.gen_range(0..4) {
        0 | 1 => chars.push(*ALPHABET.choose(rng).unwrap()),
        2 => {
            chars.pop();
        }
        _ => {
            let len = rng.gen_range(0..6);
            chars = (0..len).map(|_| *ALPHABET.choose(rng).unwrap()).collect();
        }
    }
    chars.into_iter().collect()
}

#[test]
fn random_editing_keeps_counters_ordered() {
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mode = if seed % 2 == 0 {
            InputMode::Copy
        } else {
            InputMode::English
        };
        let (mut s, clock) = session(mode, &["fn main() {}", "fn a() {}", "main"]);

        let mut value = String::new();
        for _ in 0..200 {
            value = random_edit(&mut rng, &value);
            match s.update_snapshot(&value) {
                InputOutcome::PromptCompleted(_) => value.clear(),
                InputOutcome::Finished { .. } => break,
                _ => {}
            }
            let counters = s.counters();
            assert!(counters.correct <= counters.scoring_typed, "seed {seed}: {counters:?}");
            assert!(counters.scoring_typed <= counters.total_typed, "seed {seed}: {counters:?}");
        }

        clock.advance_secs(10);
        let result = s.finish();
        assert!(result.accuracy <= 100, "seed {seed}: {result:?}");
    }
}

#[test]
fn kana_cpm_counts_keystrokes_not_kana() {
    let (mut s, clock) = session(InputMode::Japanese, &["ねこ", "いぬ"]);
    s.begin_composition();
    for (key, shown) in [('n', "n"), ('e', "ね")] {
        s.record_keystroke(Keystroke::Char(key), false);
        s.update_snapshot(shown);
    }
    s.end_composition("ね");
    s.begin_composition();
    for shown in ["ねk", "ねこ"] {
        s.record_keystroke(Keystroke::Composing, false);
        assert_eq!(s.update_snapshot(shown), InputOutcome::Buffered);
    }
    assert_matches!(s.end_composition("ねこ"), InputOutcome::PromptCompleted(_));

    clock.advance_secs(30);
    let result = s.finish();
    assert_eq!(s.counters().keystrokes, 4);
    assert_eq!(result.correct_count, 2);
    // 4 keystrokes over 30 seconds
    assert_eq!(result.cpm, 8);
}

#[test]
fn catalog_selection_builds_a_shuffled_session() {
    let bank = QuestionBank::bundled().unwrap();
    let options = GameOptions {
        language: InputMode::Copy,
        length: PromptLength::Short,
        theme_id: "rust".into(),
    };
    let expected = bank.prompts(&options).unwrap().len();
    let mut rng = StdRng::seed_from_u64(9);
    let s = Session::from_catalog(&bank, &options, SessionPolicy::default(), &mut rng).unwrap();
    assert_eq!(s.prompt_count(), expected);
    assert_eq!(s.mode(), InputMode::Copy);
}

#[test]
fn unknown_theme_is_an_error() {
    let bank = QuestionBank::bundled().unwrap();
    let options = GameOptions {
        language: InputMode::English,
        length: PromptLength::Short,
        theme_id: "nope".into(),
    };
    let mut rng = StdRng::seed_from_u64(9);
    let err = Session::from_catalog(&bank, &options, SessionPolicy::default(), &mut rng)
        .err()
        .unwrap();
    assert_matches!(err, flowtype::Error::UnknownTheme { .. });
}
