//! Turn-taking dialogue loop between exactly two personas.
//!
//! Strictly sequential: one completion request in flight at a time, each
//! persona's history mutated only from here. A run starts with a fixed seed
//! turn attributed to the second persona, then alternates completions until
//! the exchange budget is spent, a sentinel substring shows up in a
//! completion, or a completion call fails. Failures are fatal to the run;
//! there are no retries.

use eyre::Result;
use log::{info, warn};

use crate::completion::CompletionClient;
use crate::persona::Persona;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exchange budget exhausted
    Bounded,
    /// A completion contained the sentinel substring
    Sentinel,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Bounded => write!(f, "bounded"),
            RunOutcome::Sentinel => write!(f, "sentinel"),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Number of completion calls issued (a bounded run of N pairs makes 2N+1)
    pub completions: usize,
}

/// Run parameters, independent of the personas involved
#[derive(Debug, Clone)]
pub struct DialogueSettings {
    /// Maximum number of full exchange pairs after the seed turn
    pub exchanges: usize,
    /// Opening message, spoken by the second persona
    pub seed_message: String,
    /// In-band stop marker; case-sensitive substring match on completions only
    pub sentinel: Option<String>,
    /// Suppress per-turn console output
    pub quiet: bool,
}

pub struct DialogueLoop<'a, C: CompletionClient> {
    client: &'a C,
    settings: DialogueSettings,
}

impl<'a, C: CompletionClient> DialogueLoop<'a, C> {
    pub fn new(client: &'a C, settings: DialogueSettings) -> Self {
        Self { client, settings }
    }

    /// Drive the full run. `first` speaks first (in reply to the seed);
    /// `second` is credited with the seed message.
    ///
    /// Both histories are left in their final state even on error, so the
    /// caller can still export what was said before the failure.
    pub fn run(&self, first: &mut Persona, second: &mut Persona) -> Result<RunReport> {
        let mut calls = 0usize;

        // Seed turn: spoken by `second`, mirrored into both histories like
        // any other message, but never checked against the sentinel.
        second.record_spoken(&self.settings.seed_message);
        first.record_heard(&self.settings.seed_message);
        self.echo(second, &self.settings.seed_message);
        info!("seed turn from {}: {:?}", second.name, self.settings.seed_message);

        let reply = self.take_turn(first, second, &mut calls)?;
        if self.hit_sentinel(&reply) {
            return Ok(self.finish(RunOutcome::Sentinel, calls));
        }

        for pair in 0..self.settings.exchanges {
            info!("exchange pair {} of {}", pair + 1, self.settings.exchanges);

            let reply = self.take_turn(second, first, &mut calls)?;
            if self.hit_sentinel(&reply) {
                return Ok(self.finish(RunOutcome::Sentinel, calls));
            }

            let reply = self.take_turn(first, second, &mut calls)?;
            if self.hit_sentinel(&reply) {
                return Ok(self.finish(RunOutcome::Sentinel, calls));
            }
        }

        Ok(self.finish(RunOutcome::Bounded, calls))
    }

    /// One completion from `speaker`, recorded in both histories.
    fn take_turn(&self, speaker: &mut Persona, listener: &mut Persona, calls: &mut usize) -> Result<String> {
        *calls += 1;
        let prompt = speaker.snapshot();
        let content = self
            .client
            .complete(&speaker.model, &prompt)
            .map_err(|e| eyre::eyre!("completion from {} failed on call {}: {}", speaker.name, calls, e))?;

        speaker.record_spoken(&content);
        listener.record_heard(&content);
        self.echo(speaker, &content);
        Ok(content)
    }

    fn hit_sentinel(&self, content: &str) -> bool {
        match &self.settings.sentinel {
            Some(token) => {
                let hit = content.contains(token.as_str());
                if hit {
                    warn!("sentinel {:?} found, ending run", token);
                }
                hit
            }
            None => false,
        }
    }

    fn finish(&self, outcome: RunOutcome, completions: usize) -> RunReport {
        info!("run complete: {} after {} completion calls", outcome, completions);
        RunReport { outcome, completions }
    }

    fn echo(&self, speaker: &Persona, content: &str) {
        if !self.settings.quiet {
            speaker.print_banner();
            println!("{}", content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use crate::persona::{PersonaConfig, Role, Turn};
    use std::cell::Cell;

    /// Scripted stand-in for the Ollama client
    struct StubClient<F: Fn(usize) -> Result<String, CompletionError>> {
        calls: Cell<usize>,
        script: F,
    }

    impl<F: Fn(usize) -> Result<String, CompletionError>> StubClient<F> {
        fn new(script: F) -> Self {
            Self {
                calls: Cell::new(0),
                script,
            }
        }
    }

    impl<F: Fn(usize) -> Result<String, CompletionError>> CompletionClient for StubClient<F> {
        fn complete(&self, _model: &str, _history: &[Turn]) -> Result<String, CompletionError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            (self.script)(call)
        }
    }

    fn persona(name: &str) -> Persona {
        Persona::new(&PersonaConfig {
            name: name.to_string(),
            avatar: "?".to_string(),
            model: "llama3.1".to_string(),
            system_prompt: format!("You are {}.", name),
        })
        .unwrap()
    }

    fn settings(exchanges: usize, sentinel: Option<&str>) -> DialogueSettings {
        DialogueSettings {
            exchanges,
            seed_message: "Hi".to_string(),
            sentinel: sentinel.map(|s| s.to_string()),
            quiet: true,
        }
    }

    #[test]
    fn test_bounded_run_makes_2n_plus_1_calls() {
        for n in [0usize, 1, 3] {
            let client = StubClient::new(|call| Ok(format!("reply {}", call)));
            let dialogue = DialogueLoop::new(&client, settings(n, None));
            let mut a = persona("A");
            let mut b = persona("B");
            let report = dialogue.run(&mut a, &mut b).unwrap();
            assert_eq!(report.outcome, RunOutcome::Bounded);
            assert_eq!(report.completions, 2 * n + 1);
            assert_eq!(client.calls.get(), 2 * n + 1);
        }
    }

    #[test]
    fn test_roles_strictly_alternate_after_system() {
        let client = StubClient::new(|call| Ok(format!("reply {}", call)));
        let dialogue = DialogueLoop::new(&client, settings(3, None));
        let mut a = persona("A");
        let mut b = persona("B");
        dialogue.run(&mut a, &mut b).unwrap();

        for persona in [&a, &b] {
            let visible = persona.visible();
            assert!(!visible.is_empty());
            for pair in visible.windows(2) {
                assert_ne!(pair[0].role, pair[1].role, "consecutive entries share a role");
            }
        }
    }

    #[test]
    fn test_histories_mirror_with_swapped_roles() {
        let client = StubClient::new(|call| Ok(format!("reply {}", call)));
        let dialogue = DialogueLoop::new(&client, settings(2, None));
        let mut a = persona("A");
        let mut b = persona("B");
        dialogue.run(&mut a, &mut b).unwrap();

        let a_visible = a.visible();
        let b_visible = b.visible();
        assert_eq!(a_visible.len(), b_visible.len());
        for (ours, theirs) in a_visible.iter().zip(b_visible.iter()) {
            assert_eq!(ours.content, theirs.content);
            match ours.role {
                Role::Assistant => assert_eq!(theirs.role, Role::User),
                Role::User => assert_eq!(theirs.role, Role::Assistant),
                Role::System => panic!("system entry in visible slice"),
            }
        }
    }

    #[test]
    fn test_sentinel_stops_before_further_calls() {
        let client = StubClient::new(|call| {
            if call == 2 {
                Ok("ok, GAME OVER then".to_string())
            } else {
                Ok(format!("reply {}", call))
            }
        });
        let dialogue = DialogueLoop::new(&client, settings(10, Some("GAME OVER")));
        let mut a = persona("A");
        let mut b = persona("B");
        let report = dialogue.run(&mut a, &mut b).unwrap();

        assert_eq!(report.outcome, RunOutcome::Sentinel);
        assert_eq!(report.completions, 2);
        assert_eq!(client.calls.get(), 2);
        // The sentinel turn itself is recorded
        assert_eq!(b.visible().last().unwrap().content, "ok, GAME OVER then");
        assert_eq!(a.visible().last().unwrap().content, "ok, GAME OVER then");
    }

    #[test]
    fn test_sentinel_match_is_case_sensitive() {
        let client = StubClient::new(|call| Ok(format!("game over {}", call)));
        let dialogue = DialogueLoop::new(&client, settings(1, Some("GAME OVER")));
        let mut a = persona("A");
        let mut b = persona("B");
        let report = dialogue.run(&mut a, &mut b).unwrap();
        assert_eq!(report.outcome, RunOutcome::Bounded);
        assert_eq!(report.completions, 3);
    }

    #[test]
    fn test_sentinel_in_seed_is_ignored() {
        let client = StubClient::new(|call| Ok(format!("reply {}", call)));
        let mut settings = settings(1, Some("Hi"));
        settings.seed_message = "Hi".to_string();
        let dialogue = DialogueLoop::new(&client, settings);
        let mut a = persona("A");
        let mut b = persona("B");
        let report = dialogue.run(&mut a, &mut b).unwrap();
        assert_eq!(report.outcome, RunOutcome::Bounded);
    }

    #[test]
    fn test_one_pair_with_stub_ok() {
        let client = StubClient::new(|_| Ok("ok".to_string()));
        let dialogue = DialogueLoop::new(&client, settings(1, None));
        let mut a = persona("A");
        let mut b = persona("B");
        let report = dialogue.run(&mut a, &mut b).unwrap();

        assert_eq!(report.outcome, RunOutcome::Bounded);
        // Seed plus three completions, visible in both histories
        assert_eq!(a.visible().len(), 4);
        assert_eq!(b.visible().len(), 4);
        assert_eq!(a.visible()[0], Turn::new(Role::User, "Hi"));
        assert_eq!(b.visible()[0], Turn::new(Role::Assistant, "Hi"));
    }

    #[test]
    fn test_failure_on_second_call_is_fatal() {
        let client = StubClient::new(|call| {
            if call >= 2 {
                Err(CompletionError::Upstream("connection reset".to_string()))
            } else {
                Ok("first reply".to_string())
            }
        });
        let dialogue = DialogueLoop::new(&client, settings(5, None));
        let mut a = persona("A");
        let mut b = persona("B");
        let err = dialogue.run(&mut a, &mut b).unwrap_err();

        // One successful call, one failed, nothing after
        assert_eq!(client.calls.get(), 2);
        assert!(err.to_string().contains("B"));
        assert!(err.to_string().contains("call 2"));
        assert_eq!(a.visible().len(), 2);
        assert_eq!(a.visible()[1], Turn::new(Role::Assistant, "first reply"));
        assert_eq!(b.visible().len(), 2);
        assert_eq!(b.visible()[1], Turn::new(Role::User, "first reply"));
    }

    #[test]
    fn test_blank_completion_is_fatal() {
        let client = StubClient::new(|_| Err(CompletionError::Empty));
        let dialogue = DialogueLoop::new(&client, settings(1, None));
        let mut a = persona("A");
        let mut b = persona("B");
        let err = dialogue.run(&mut a, &mut b).unwrap_err();
        assert!(err.to_string().contains("empty completion"));
        assert_eq!(client.calls.get(), 1);
    }
}
