//! Conversation runtime executor

use super::traits::{Classifier, Responder, UserIo};
use super::RuntimeError;
use crate::llm::MessageRole;
use crate::prompts;
use crate::state_machine::{
    is_exit_keyword, transition, ConvContext, ConversationState, Effect, Event,
};
use chrono::Utc;

/// Drives one conversation to completion with injected capabilities
pub struct ConversationRuntime<C, R, U>
where
    C: Classifier,
    R: Responder,
    U: UserIo,
{
    context: ConvContext,
    state: ConversationState,
    classifier: C,
    responder: R,
    io: U,
}

impl<C, R, U> ConversationRuntime<C, R, U>
where
    C: Classifier,
    R: Responder,
    U: UserIo,
{
    pub fn new(
        context: ConvContext,
        state: ConversationState,
        classifier: C,
        responder: R,
        io: U,
    ) -> Self {
        Self {
            context,
            state,
            classifier,
            responder,
            io,
        }
    }

    /// Run until the terminal step, an exit keyword, or end of input.
    ///
    /// Returns the final state. Only transition errors (a step with no
    /// handler) and console failures abort the run.
    pub async fn run(mut self) -> Result<ConversationState, RuntimeError> {
        tracing::info!(
            session_id = %self.context.session_id,
            variant = ?self.state.variant(),
            "Starting conversation"
        );

        let mut pending: Option<Event> = None;

        while !self.state.step.is_terminal() {
            let event = match pending.take() {
                Some(event) => event,
                None if self.state.step.awaits_input() => match self.io.read_line().await? {
                    None => {
                        tracing::info!(session_id = %self.context.session_id, "Input closed");
                        self.io.show(prompts::GOODBYE);
                        break;
                    }
                    Some(line) if is_exit_keyword(&line) => {
                        tracing::info!(session_id = %self.context.session_id, "User exited");
                        self.io.show(prompts::GOODBYE);
                        break;
                    }
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => Event::user_input(line.trim(), Utc::now()),
                },
                None => Event::Advance,
            };

            pending = self.handle_event(event).await?;
        }

        tracing::info!(
            session_id = %self.context.session_id,
            turns = self.state.messages.len(),
            items = self.state.items.len(),
            "Conversation finished"
        );
        Ok(self.state)
    }

    /// Apply one event; returns the reply event of any external call made
    async fn handle_event(&mut self, event: Event) -> Result<Option<Event>, RuntimeError> {
        let from = self.state.step.label();
        let event_name = event.name();

        let result = transition(&self.state, &self.context, event).inspect_err(|e| {
            tracing::error!(
                session_id = %self.context.session_id,
                step = from,
                event = event_name,
                error = %e,
                "Transition failed"
            );
        })?;

        for turn in &result.update.messages {
            if turn.role == MessageRole::Assistant {
                self.io.show(&turn.text);
            }
        }
        self.state = self.state.merge(result.update);

        tracing::debug!(
            session_id = %self.context.session_id,
            from,
            to = self.state.step.label(),
            event = event_name,
            "Transition"
        );

        let mut next = None;
        for effect in result.effects {
            next = Some(self.execute_effect(effect).await);
        }
        Ok(next)
    }

    async fn execute_effect(&self, effect: Effect) -> Event {
        match effect {
            Effect::Classify(request) => {
                let reply = self.classifier.classify(&request).await;
                match &reply {
                    Ok(label) => tracing::debug!(
                        session_id = %self.context.session_id,
                        kind = ?request.kind,
                        %label,
                        "Classified"
                    ),
                    Err(e) => tracing::warn!(
                        session_id = %self.context.session_id,
                        kind = ?request.kind,
                        error = %e,
                        "Classifier call failed, using fallback"
                    ),
                }
                Event::Classified { reply }
            }
            Effect::Respond(request) => {
                let reply = self.responder.respond(&request).await;
                if let Err(e) = &reply {
                    tracing::warn!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "Responder call failed, using fallback"
                    );
                }
                Event::Responded { reply }
            }
        }
    }
}
