//! Fixed message text: intros, titles, the footer and inbox replies.

use fresh_core::subscription::{Cadence, Outcome};

const COMPOSE_URL: &str = "https://www.reddit.com/message/compose/";

/// Who the bot is and where it lives; threaded into every template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  /// The bot account's handle, without the `/u/` prefix.
  pub bot:        String,
  /// The administrator's handle, without the `/u/` prefix.
  pub admin:      String,
  /// The scanned community, without the `/r/` prefix.
  pub community:  String,
  pub source_url: Option<String>,
}

impl Identity {
  fn compose_link(&self, label: &str, subject: &str, message: &str) -> String {
    format!(
      "^[[{label}]({COMPOSE_URL}?to={}&subject={subject}&message={message})]",
      self.bot
    )
  }

  /// The block appended to every outgoing message: subscribe, unsubscribe,
  /// source and feedback links.
  pub fn footer(&self) -> String {
    let mut footer = String::from("\n\n---\n\n^(This message was generated by a bot)\n\n");
    footer.push_str("^Subscribe ^to ^roundups: ");
    footer.push_str(&self.compose_link("Daily", "subscribe", "daily"));
    footer.push(' ');
    footer.push_str(&self.compose_link("Weekly", "subscribe", "weekly"));
    footer.push(' ');
    footer.push_str(&self.compose_link("Both", "subscribe", "both"));
    footer.push(' ');
    footer.push_str(&self.compose_link("Unsubscribe", "unsubscribe", "remove"));
    footer.push_str("\n\n");
    if let Some(source) = &self.source_url {
      footer.push_str(&format!("^[[Source]({source})] "));
    }
    footer.push_str(&format!(
      "^[[Feedback]({COMPOSE_URL}?to={admin}&subject=%2Fu%2F{bot}%20feedback\
       &message=If%20you%20are%20providing%20feedback%20about%20a%20specific%20post%2C\
       %20please%20include%20the%20link%20to%20that%20post.%20Thanks!)]",
      admin = self.admin,
      bot = self.bot,
    ));
    footer
  }

  pub fn intro(&self, cadence: Cadence) -> String {
    match cadence {
      Cadence::Daily => format!(
        "Welcome to The Daily \\[Fresh\\]ness! Fresh /r/{} posts delivered right to your \
         inbox every day.\n\n",
        self.community
      ),
      Cadence::Weekly => format!(
        "Welcome to The Weekly \\[Fresh\\]ness! Fresh /r/{} posts delivered right to your \
         inbox every week.\n\n",
        self.community
      ),
    }
  }

  // ── Inbox replies ─────────────────────────────────────────────────────

  /// Reply to a sender whose message was forwarded to the administrator.
  pub fn forwarded_reply(&self) -> String {
    format!(
      "I received your message, but I'm just a bot! I forwarded it to my admin /u/{} who \
       will take a look at it when they get a chance.\n\nIf it's urgent, you should PM them \
       directly.\n\nIf you're trying to subscribe to one of the roundups, use the links \
       below.\n\nThanks!",
      self.admin
    )
  }
}

/// Title of a digest, keyed by the label of its earliest day.
pub fn digest_title(cadence: Cadence, first_label: &str) -> String {
  match cadence {
    Cadence::Daily => format!("The Daily Freshness for {first_label}"),
    Cadence::Weekly => format!("The Weekly Freshness for the week beginning {first_label}"),
  }
}

/// Reply to a message whose subject was recognised but whose body was not.
pub const UNCLEAR_REPLY: &str =
  "I couldn't understand your message. Please use one of the links below to subscribe!";

/// Reply describing a subscription change.
pub fn outcome_reply(outcome: Outcome) -> String {
  match outcome {
    Outcome::Subscribed(level) => format!("You have been subscribed to the {level} mailing list"),
    Outcome::AlreadySubscribed(level) => {
      format!("You are already subscribed to the \"{level}\" mailing list!")
    }
    Outcome::UpgradedToBoth => "You have been subscribed to both mailing lists!".to_owned(),
    Outcome::Downgraded { removed } => {
      format!("You have been unsubscribed from the {removed} mailing list.")
    }
    Outcome::Removed => {
      "You have been unsubscribed from both mailing lists. Sorry to see you go!".to_owned()
    }
    Outcome::NotSubscribed => "Unable to unsubscribe because you are not currently subscribed \
                               to any mailing lists."
      .to_owned(),
  }
}

/// Body of a private message forwarded to the administrator.
pub fn forwarded_message(author: &str, subject: &str, body: &str) -> String {
  format!("Message from /u/{author}\n\nSubject: {subject}\n\n---\n\n{body}")
}

/// Body of a comment notification forwarded to the administrator.
pub fn forwarded_comment(author: &str, subject: &str, context: &str, body: &str) -> String {
  format!("Message from /u/{author}\n\nSubject: {subject}\n\nContext: {context}\n\n---\n\n{body}")
}
