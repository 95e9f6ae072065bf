//! One-shot messages carried in the session to the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::routes::error::WebResult;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
	Success,
	Error,
}

impl FlashKind {
	/// Bootstrap alert class.
	pub fn css_class(&self) -> &'static str {
		match self {
			FlashKind::Success => "alert-success",
			FlashKind::Error => "alert-danger",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
	pub kind: FlashKind,
	pub message: String,
}

impl Flash {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			kind: FlashKind::Success,
			message: message.into(),
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			kind: FlashKind::Error,
			message: message.into(),
		}
	}

	/// Stores the message for the next page rendered in this session.
	pub async fn push(self, session: &Session) -> WebResult<()> {
		session.insert(FLASH_KEY, self).await?;
		Ok(())
	}

	/// Takes the pending message, so it is shown only once.
	///
	/// A session left empty is deleted from the store.
	pub async fn take(session: &Session) -> WebResult<Option<Self>> {
		let flash = session.remove::<Self>(FLASH_KEY).await?;
		if flash.is_some() && session.is_empty().await {
			session.flush().await?;
		}
		Ok(flash)
	}
}
