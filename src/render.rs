//! Static HTML chat-bubble render of a transcript.
//!
//! One bubble per entry. Alignment follows entry position parity: even
//! indices sit left with the first avatar, odd indices sit right with the
//! second. The transcript handed in always starts at the seed turn and is
//! never reordered, so parity tracks speaker identity.

use eyre::{Context, Result};
use std::fs;
use std::path::Path;

use crate::transcript::Transcript;

pub const DEFAULT_OUTPUT: &str = "dialogue.html";

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no">
    <title>Dialogue Transcript</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            background-color: #f4f4f4;
            margin: 0;
            padding: 20px;
        }
        .container {
            max-width: 800px;
            margin: 0 auto;
        }
        .message {
            display: flex;
            margin-bottom: 20px;
            align-items: flex-start;
        }
        .message.left {
            flex-direction: row;
        }
        .message.right {
            flex-direction: row-reverse;
        }
        .avatar {
            font-size: 50px;
            margin: 0 10px;
            line-height: 1;
        }
        .bubble {
            max-width: 70%;
            padding: 10px 15px;
            border-radius: 15px;
            position: relative;
            background-color: #ffffff;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            word-wrap: break-word;
            font-size: 16px;
            line-height: 1.4;
        }
        .left .bubble {
            background-color: #007BFF;
            color: #ffffff;
            border-bottom-left-radius: 0;
        }
        .right .bubble {
            background-color: #28A745;
            color: #ffffff;
            border-bottom-right-radius: 0;
        }
        @media (max-width: 600px) {
            .bubble {
                max-width: 85%;
            }
            .avatar {
                font-size: 30px;
            }
        }
    </style>
</head>
<body>
    <div class="container">
"#;

const PAGE_FOOT: &str = r#"    </div>
</body>
</html>
"#;

/// Escape `&`, `<`, `>` and turn newlines into `<br>`
fn escape_html(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br>")
}

/// Build the full HTML document for a transcript
pub fn render_html(transcript: &Transcript, avatar_left: &str, avatar_right: &str) -> String {
    let mut html = String::from(PAGE_HEAD);

    for (index, entry) in transcript.entries().iter().enumerate() {
        let (alignment, avatar) = if index % 2 == 0 {
            ("left", avatar_left)
        } else {
            ("right", avatar_right)
        };

        html.push_str(&format!(
            r#"        <div class="message {alignment}">
            <div class="avatar">{avatar}</div>
            <div class="bubble">
                <strong>{role}</strong><br>
                {content}
            </div>
        </div>
"#,
            alignment = alignment,
            avatar = avatar,
            role = escape_html(&entry.role),
            content = escape_html(&entry.content),
        ));
    }

    html.push_str(PAGE_FOOT);
    html
}

/// Render and write the document, overwriting `path`
pub fn write_html(transcript: &Transcript, path: &Path, avatar_left: &str, avatar_right: &str) -> Result<()> {
    let html = render_html(transcript, avatar_left, avatar_right);
    fs::write(path, html).context(format!("Failed to write HTML to {}", path.display()))?;
    Ok(())
}
