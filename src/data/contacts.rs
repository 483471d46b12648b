//! Contacts sub-elements.
//!
//! Only `gContact:calendarLink` lives here. It is not a feed entry and no
//! calendar factory can parse or serialize it on its own.

use std::fmt;

use serde::Serialize;

use crate::error::GDataError;

gdata_enum! {
    /// `rel` of a calendar link.
    CalendarLinkType {
        Home => "home",
        Work => "work",
        FreeBusy => "free-busy",
    }
}

/// URL of one of the contact's calendars. The element can be repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarLink {
    pub rel: Option<CalendarLinkType>,
    /// Free-form label, used instead of `rel`.
    pub label: Option<String>,
    pub primary: bool,
    pub href: Option<String>,
}

impl CalendarLink {
    /// A link needs an `href` and exactly one of `rel` or `label`.
    pub fn validate(&self) -> Result<(), GDataError> {
        if self.href.as_deref().map_or(true, str::is_empty) {
            return Err(GDataError::malformed("calendarLink is missing href"));
        }
        let has_label = self.label.as_deref().is_some_and(|l| !l.is_empty());
        if self.rel.is_some() == has_label {
            return Err(GDataError::malformed(
                "calendarLink must have exactly one of rel or label",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CalendarLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CalendarLink")?;
        if let Some(rel) = self.rel {
            write!(f, " type:{}", rel.as_str())?;
        }
        if let Some(label) = self.label.as_deref().filter(|l| !l.is_empty()) {
            write!(f, " label:{}", label)?;
        }
        write!(f, " primary:{}", self.primary)?;
        if let Some(href) = self.href.as_deref().filter(|h| !h.is_empty()) {
            write!(f, " href:{}", href)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> CalendarLink {
        CalendarLink {
            rel: Some(CalendarLinkType::Work),
            label: None,
            primary: true,
            href: Some("https://calendar.example.com/work".to_string()),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            link().to_string(),
            "CalendarLink type:work primary:true href:https://calendar.example.com/work"
        );
    }

    #[test]
    fn test_display_omits_empty_href() {
        let l = CalendarLink {
            label: Some("Band".to_string()),
            ..CalendarLink::default()
        };
        assert_eq!(l.to_string(), "CalendarLink label:Band primary:false");
    }

    #[test]
    fn test_validate() {
        assert!(link().validate().is_ok());

        let mut both = link();
        both.label = Some("Office".to_string());
        assert!(both.validate().is_err());

        let mut neither = link();
        neither.rel = None;
        assert!(neither.validate().is_err());

        let mut no_href = link();
        no_href.href = None;
        assert!(no_href.validate().is_err());
    }
}
