// Human-readable rendering of profiles, used by the demo binary output.
// ---------------------------------------------------------------------------

use std::fmt;

use crate::schema::{timestamp, Preferences, UserProfile};

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "theme={}, notifications={}",
            self.theme.as_deref().unwrap_or("-"),
            self.notifications
                .map(|enabled| enabled.to_string())
                .as_deref()
                .unwrap_or("-")
        )
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Non-numeric sort keys are shown as stored.
        let when = timestamp::to_utc_datetime(&self.timestamp)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|_| self.timestamp.clone());
        write!(f, "{} @ {}", self.user_id, when)?;
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            write!(f, " ({name})")?;
        }
        if let Some(email) = &self.email {
            write!(f, " <{email}>")?;
        }
        if let Some(login_count) = self.login_count {
            write!(f, " logins={login_count}")?;
        }
        if let Some(preferences) = &self.preferences {
            write!(f, " [{preferences}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{Preferences, UserProfile};

    #[test]
    fn test_display_full_profile() {
        let profile = UserProfile {
            user_id: "user123".to_string(),
            timestamp: "1698768000".to_string(),
            email: Some("user123@example.com".to_string()),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            preferences: Some(Preferences {
                theme: Some("dark".to_string()),
                notifications: None,
            }),
            login_count: Some(42),
            ..Default::default()
        };
        assert_eq!(
            profile.to_string(),
            "user123 @ 2023-10-31 16:00:00 UTC (John Doe) <user123@example.com> logins=42 \
             [theme=dark, notifications=-]"
        );
    }

    #[test]
    fn test_display_sparse_profile() {
        let profile = UserProfile {
            user_id: "user456".to_string(),
            timestamp: "not-a-time".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.to_string(), "user456 @ not-a-time");
    }
}
