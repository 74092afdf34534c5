//! Frame documents
//!
//! Every view is a flat [`FrameView`] rendered to an HTML page whose
//! `fc:frame` meta tags drive the client; the body mirrors the same
//! information for browsers.

use tumbller_shared::codec::{self, escape, PaymentFrame};
use tumbller_shared::Direction;

/// Frame clients show at most this many buttons
pub const MAX_BUTTONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// `post`, `link` or `tx`
    pub action: String,
    pub target: Option<String>,
}

impl Button {
    pub fn post(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: "post".into(),
            target: Some(target.into()),
        }
    }
}

/// Data bag for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameView {
    pub title: String,
    pub image: String,
    pub post_url: Option<String>,
    pub buttons: Vec<Button>,
    pub device_id: Option<String>,
    pub time_left: Option<String>,
    pub previous_command: Option<String>,
    pub status: Option<String>,
}

impl FrameView {
    /// One-line summary for `og:description` and the page body
    fn description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(time_left) = &self.time_left {
            parts.push(format!("Time left: {}", time_left));
        }
        if let Some(previous) = &self.previous_command {
            parts.push(format!("Last command: {}", previous));
        }
        if let Some(status) = &self.status {
            parts.push(status.clone());
        }
        parts.join(" | ")
    }

    pub fn render(&self) -> String {
        let description = self.description();
        let mut head = vec![
            codec::encode(codec::OG_TITLE, &self.title),
            codec::encode("og:image", &self.image),
            codec::encode("fc:frame", "vNext"),
            codec::encode(codec::FRAME_IMAGE, &self.image),
        ];
        if !description.is_empty() {
            head.push(codec::encode("og:description", &description));
        }
        if let Some(post_url) = &self.post_url {
            head.push(codec::encode(codec::FRAME_POST_URL, post_url));
        }
        if let Some(device_id) = &self.device_id {
            head.push(codec::encode("tumbller:device", device_id));
        }

        for (i, button) in self.buttons.iter().take(MAX_BUTTONS).enumerate() {
            let key = format!("fc:frame:button:{}", i + 1);
            head.push(codec::encode(&key, &button.label));
            head.push(codec::encode(&format!("{}:action", key), &button.action));
            if let Some(target) = &button.target {
                head.push(codec::encode(&format!("{}:target", key), target));
            }
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{title}</title>\n{head}\n</head>\n<body>\n<h1>{title}</h1>\n<img src=\"{image}\" alt=\"{title}\" />\n<p>{description}</p>\n</body>\n</html>\n",
            title = escape(&self.title),
            head = head.join("\n"),
            image = escape(&self.image),
            description = escape(&description),
        )
    }
}

/// Which half of the controls a control view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Forward, back, stop, camera
    Drive,
    /// Left, right, camera, stop
    Turn,
}

impl Panel {
    /// Turning keeps the turn controls up; everything else drives
    pub fn after(direction: Direction) -> Self {
        match direction {
            Direction::Left | Direction::Right => Panel::Turn,
            _ => Panel::Drive,
        }
    }
}

/// Builds the views of the frame flow against a public base URL
#[derive(Debug, Clone)]
pub struct Views {
    base_url: String,
    /// Landing image
    image: String,
}

impl Views {
    pub fn new(base_url: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            image: image.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Landing page with one button per rover
    pub fn selection(&self, device_ids: &[String]) -> FrameView {
        FrameView {
            title: "Tumbller Rover Control".into(),
            image: self.image.clone(),
            post_url: Some(self.url("/")),
            buttons: device_ids
                .iter()
                .map(|id| Button::post(format!("Rover {}", id), self.url(&format!("/select/{}", id))))
                .collect(),
            status: Some("Pick a rover to drive".into()),
            ..Default::default()
        }
    }

    /// Someone else is driving
    pub fn waiting(&self, device_id: &str, time_left: &str) -> FrameView {
        FrameView {
            title: format!("Rover {} is busy", device_id),
            image: self.image.clone(),
            post_url: Some(self.url("/")),
            buttons: vec![
                Button::post("Refresh", self.url(&format!("/select/{}", device_id))),
                Button::post("Other rovers", self.url("/")),
            ],
            device_id: Some(device_id.to_string()),
            time_left: Some(time_left.to_string()),
            status: Some(format!("Available in {}", time_left)),
            ..Default::default()
        }
    }

    /// The processor's payment frame, relayed as-is
    pub fn payment(&self, device_id: &str, frame: &PaymentFrame) -> FrameView {
        let post_url = if frame.post_url.is_empty() {
            self.url(&format!("/callback/{}", device_id))
        } else {
            frame.post_url.clone()
        };

        FrameView {
            title: frame.title.clone(),
            image: frame.image.clone(),
            post_url: Some(post_url),
            buttons: vec![Button {
                label: frame.button_label.clone(),
                action: frame.button_action.clone(),
                target: Some(frame.button_target.clone()).filter(|t| !t.is_empty()),
            }],
            device_id: Some(device_id.to_string()),
            ..Default::default()
        }
    }

    pub fn payment_failed(&self, device_id: &str, reason: &str) -> FrameView {
        FrameView {
            title: "Payment failed".into(),
            image: self.image.clone(),
            post_url: Some(self.url("/")),
            buttons: vec![
                Button::post("Try again", self.url(&format!("/select/{}", device_id))),
                Button::post("Other rovers", self.url("/")),
            ],
            device_id: Some(device_id.to_string()),
            status: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// Controls for the session holder
    pub fn control(
        &self,
        device_id: &str,
        image: Option<&str>,
        time_left: &str,
        previous: Option<Direction>,
        status: Option<&str>,
        panel: Panel,
    ) -> FrameView {
        let control = |d: Direction| self.url(&format!("/control/{}/{}", device_id, d));
        let camera = Button::post("Camera", self.url(&format!("/camera/{}", device_id)));

        let buttons = match panel {
            Panel::Drive => vec![
                Button::post("Forward", control(Direction::Forward)),
                Button::post("Back", control(Direction::Backward)),
                Button::post("Stop", control(Direction::Stop)),
                camera,
            ],
            Panel::Turn => vec![
                Button::post("Left", control(Direction::Left)),
                Button::post("Right", control(Direction::Right)),
                camera,
                Button::post("Stop", control(Direction::Stop)),
            ],
        };

        FrameView {
            title: format!("Driving rover {}", device_id),
            image: image.unwrap_or(&self.image).to_string(),
            post_url: Some(self.url(&format!("/control/{}/stop", device_id))),
            buttons,
            device_id: Some(device_id.to_string()),
            time_left: Some(time_left.to_string()),
            previous_command: previous.map(|d| d.to_string()),
            status: status.map(str::to_string),
        }
    }
}
