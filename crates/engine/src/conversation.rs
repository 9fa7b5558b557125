use anyhow::Result;
use tracing::info;

use quotebot_shared::{directive, CallDescriptor, CapabilityResult, Dispatcher};

use crate::catalog::Catalog;
use crate::client::ChatCompletion;
use crate::Message;

pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful assistant with access to the following functions. Use them if required- ";
pub const FUNCTION_RESPONSE_PREFIX: &str = "Function Response: ";

pub fn system_prompt(catalog: &Catalog) -> String {
    format!("{}{}", SYSTEM_PREAMBLE, catalog.to_json())
}

/// What came out of one question.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub call: Option<CallDescriptor>,
    pub result: Option<CapabilityResult>,
}

/// One conversation: the transcript plus the services it talks to.
pub struct Session<C> {
    chat: C,
    dispatcher: Dispatcher,
    transcript: Vec<Message>,
}

impl<C: ChatCompletion> Session<C> {
    pub fn new(chat: C, dispatcher: Dispatcher, catalog: &Catalog) -> Self {
        Self {
            chat,
            dispatcher,
            transcript: vec![Message::system(system_prompt(catalog))],
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Asks a question, running at most one function call the model requests.
    ///
    /// When the reply carries no usable directive it is the answer. Otherwise
    /// the capability result (empty if the call failed) goes back to the model
    /// and its second reply is the answer.
    pub async fn ask(&mut self, question: &str) -> Result<TurnOutcome> {
        self.transcript.push(Message::user(question));
        let reply = self.send().await?;

        let Some(call) = directive::extract(&reply) else {
            return Ok(TurnOutcome {
                answer: reply,
                call: None,
                result: None,
            });
        };

        info!(capability = %call.name, "model requested a function call");
        let result = self.dispatcher.dispatch(&call).await;

        self.transcript.push(Message::user(format!(
            "{}{}",
            FUNCTION_RESPONSE_PREFIX,
            result.to_json()
        )));
        let answer = self.send().await?;

        Ok(TurnOutcome {
            answer,
            call: Some(call),
            result: Some(result),
        })
    }

    async fn send(&mut self) -> Result<String> {
        let reply = self.chat.complete(&self.transcript).await?;
        self.transcript.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}
