//! Canned narration for phase transitions and outcomes. Each event picks one
//! phrase from a small table so replays read differently without an extra
//! model call.

use rand::seq::SliceRandom;

use crate::engine::rules::TallyOutcome;
use std::collections::BTreeMap;

fn pick<'a>(phrases: &[&'a str]) -> &'a str {
    phrases.choose(&mut rand::thread_rng()).copied().unwrap_or("")
}

pub fn night_begins(round: u32) -> String {
    let phrase = pick(&[
        "The moon hangs high, casting long shadows across the silent town. Night falls, and Round {n} begins under its dark cloak.",
        "Silence descends as the sun dips below the horizon. Darkness creeps in, marking the start of Round {n}. What terrors will this night hold?",
        "As villagers seek refuge in their homes, a chilling quiet settles. The night phase of Round {n} has commenced. Eyes watch from the shadows.",
    ]);
    phrase.replace("{n}", &round.to_string())
}

pub fn day_begins(round: u32) -> String {
    let phrase = pick(&[
        "Dawn breaks, painting the sky in hues of hope and trepidation. The town slowly stirs as Day {n} begins.",
        "The first rays of sunlight pierce the lingering darkness. Villagers emerge cautiously to face Day {n}.",
        "A new day arrives, heavy with the weight of the night's uncertainty. Day {n} is here.",
    ]);
    phrase.replace("{n}", &round.to_string())
}

pub fn death_announcement(victim: &str) -> String {
    let phrase = pick(&[
        "A grim discovery casts a pall over the morning. {v} lies still, a victim of the night's unseen horrors.",
        "The fragile peace of dawn is shattered. Tragedy has struck: {v} did not survive the night.",
        "Fear grips the town as the terrible news spreads: {v} has been found dead.",
    ]);
    phrase.replace("{v}", victim)
}

pub fn no_death() -> String {
    pick(&[
        "A tense silence hangs in the air. Against all odds, everyone seems to have survived the night. But the danger is far from over.",
        "Miraculously, the night passed without bloodshed. Yet, as villagers exchange uneasy glances, suspicion lingers palpably.",
        "Dawn arrives with a sigh of relief, but little comfort. No one fell victim to the darkness this time, but the impostor remains among us.",
    ])
    .to_string()
}

/// Multi-line summary of the tally: an opener, the per-target counts sorted
/// by descending count, then the outcome line.
pub fn vote_results(counts: &BTreeMap<String, usize>, outcome: &TallyOutcome) -> String {
    let mut parts = vec![pick(&[
        "The tension is palpable as the votes are revealed.",
        "All eyes turn to the center of the town square as the tally is announced.",
        "The moment of judgment arrives. The votes have been counted.",
    ])
    .to_string()];

    match outcome {
        TallyOutcome::NoVotes => {
            parts.push(
                pick(&[
                    "Strangely, no votes were cast.",
                    "An eerie silence follows the call for votes. None were submitted.",
                    "The ballot box remains empty.",
                ])
                .to_string(),
            );
            parts.push("No one faces execution today.".to_string());
        }
        TallyOutcome::Execute(target) => {
            parts.push(counts_summary(counts));
            let phrase = pick(&[
                "With the most votes cast against them, {t} stands accused.",
                "The town's suspicion coalesces. {t} receives the most votes.",
                "By the town's decision, {t} has been singled out.",
            ]);
            parts.push(phrase.replace("{t}", target));
        }
        TallyOutcome::Tie(tied) => {
            parts.push(counts_summary(counts));
            let names = tied.join(", ");
            let phrase = pick(&[
                "The vote is split! A tie between {t} means no one faces the gallows today.",
                "Indecision grips the town. With votes tied for {t}, execution is stayed.",
                "A deadlock! {t} received equal votes. Justice, or perhaps chaos, waits another day.",
            ]);
            parts.push(phrase.replace("{t}", &names));
        }
    }
    parts.join("\n")
}

fn counts_summary(counts: &BTreeMap<String, usize>) -> String {
    let mut ordered: Vec<(&String, &usize)> = counts.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let summary = ordered
        .iter()
        .map(|(target, count)| format!("{target}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("The final counts are: {summary}.")
}

pub fn execution(executed: &str) -> String {
    let phrase = pick(&[
        "The sentence is carried out. {p} meets their fate at the hands of the town.",
        "A heavy silence falls as {p} is executed. Was justice served, or has the town erred?",
        "The town's judgment is final. {p} is no more.",
    ]);
    phrase.replace("{p}", executed)
}

pub fn no_execution(reason: &str) -> String {
    let phrase = pick(&[
        "Due to {r}, the town square remains empty. There will be no execution today.",
        "With the vote resulting in {r}, the accused are spared... for now.",
        "The proceedings halt. A {r} prevents an execution.",
    ]);
    phrase.replace("{r}", reason)
}

/// How a decision ultimately failed, for narration purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GmFailureClass {
    /// The actor produced no output at all.
    CallFailure,
    /// Output arrived but could not be read as an action.
    ParseFailure,
    /// Interpretation was attempted and still found no valid choice.
    Unrecoverable,
}

/// The game master's line when an action is finally abandoned. Reason and
/// consequence are drawn separately so the pairing varies.
pub fn gm_intervention(player_id: &str, action_label: &str, class: GmFailureClass) -> String {
    let context = format!("observing Player {player_id}'s attempt to {action_label}");
    let (reason, consequence) = match class {
        GmFailureClass::ParseFailure => (
            pick(&[
                "{c}, finds their response confusing or ambiguous.",
                "{c}, cannot decipher a clear action from their words.",
                "{c}, sees they provided an unclear choice.",
            ]),
            pick(&[
                "As a result, their action this time has no effect.",
                "Therefore, their turn passes without a specific action being registered.",
                "Regrettably, their intended action could not be determined and fails.",
            ]),
        ),
        GmFailureClass::CallFailure => (
            pick(&[
                "{c}, senses a moment of profound silence or disconnection.",
                "{c}, perceives that the player is unresponsive.",
                "{c}, notes an unexpected absence of thought or action.",
            ]),
            pick(&[
                "Their turn is skipped due to this unresponsiveness.",
                "No action is taken by them this round.",
                "The moment passes, and their opportunity for action is lost.",
            ]),
        ),
        GmFailureClass::Unrecoverable => (
            pick(&[
                "despite trying to interpret Player {p}'s unclear {a} response,",
                "after reviewing Player {p}'s ambiguous {a} choice,",
            ]),
            pick(&[
                "a clear intention could not be reliably determined. The action fails.",
                "a valid choice could not be extracted. Their turn concludes without action.",
            ]),
        ),
    };
    let reason = reason
        .replace("{c}", &context)
        .replace("{p}", player_id)
        .replace("{a}", action_label);
    format!("{reason} {consequence}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_number_is_substituted() {
        assert!(night_begins(3).contains("Round 3"));
        assert!(day_begins(7).contains("Day 7"));
    }

    #[test]
    fn names_appear_in_event_narration() {
        assert!(death_announcement("Bob").contains("Bob"));
        assert!(execution("Alice").contains("Alice"));
        assert!(no_execution("tie").contains("tie"));
    }

    #[test]
    fn vote_results_orders_counts_descending() {
        let counts: BTreeMap<String, usize> =
            [("Alice".to_string(), 1), ("Bob".to_string(), 3)].into();
        let text = vote_results(&counts, &TallyOutcome::Execute("Bob".to_string()));
        assert!(text.contains("Bob: 3, Alice: 1"));
        assert!(text.contains("Bob"));
    }

    #[test]
    fn no_votes_narration_skips_the_count_line() {
        let text = vote_results(&BTreeMap::new(), &TallyOutcome::NoVotes);
        assert!(!text.contains("final counts"));
        assert!(text.contains("No one faces execution today."));
    }

    #[test]
    fn gm_intervention_names_the_player_and_action() {
        for class in [
            GmFailureClass::CallFailure,
            GmFailureClass::ParseFailure,
            GmFailureClass::Unrecoverable,
        ] {
            let line = gm_intervention("Charlie", "vote", class);
            assert!(line.contains("Charlie"), "missing player in: {line}");
            assert!(line.contains("vote"), "missing action in: {line}");
        }
    }
}
