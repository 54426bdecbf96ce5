use crate::models::EntryParams;
use crate::view::{LeaderboardView, PageView, Tone};
use std::time::Duration;

pub fn render_index(page: &PageView, params: &EntryParams, refresh_every: Duration) -> String {
    let (feedback_text, feedback_class, dismiss) = match &page.feedback {
        Some(feedback) => (
            escape_html(&feedback.message),
            format!("feedback show {}", feedback.severity.as_str()),
            feedback
                .dismiss_after_ms
                .map_or_else(|| "0".to_string(), |ms| ms.to_string()),
        ),
        None => (String::new(), "feedback".to_string(), "0".to_string()),
    };
    let tone = match page.welcome.tone {
        Tone::Ok => "ok",
        Tone::Warn => "warn",
    };

    fill(
        INDEX_HTML,
        &[
            ("WELCOME", escape_html(&page.welcome.message)),
            ("WELCOME_TONE", tone.to_string()),
            ("STREAK", page.stats.current_streak.to_string()),
            ("DAY", page.stats.day_number.to_string()),
            ("TOTAL", page.stats.total_completions.to_string()),
            ("BUTTON_LABEL", escape_html(&page.button.label)),
            (
                "BUTTON_DISABLED",
                if page.button.enabled { "" } else { "disabled" }.to_string(),
            ),
            ("FEEDBACK_CLASS", feedback_class),
            ("FEEDBACK", feedback_text),
            ("FEEDBACK_DISMISS", dismiss),
            ("LEADERBOARD", render_leaderboard(&page.leaderboard)),
            ("NAME_JSON", script_string(params.name.as_deref())),
            ("EMAIL_JSON", script_string(params.email.as_deref())),
            ("REFRESH_MS", refresh_every.as_millis().to_string()),
        ],
    )
}

pub fn render_leaderboard(view: &LeaderboardView) -> String {
    if let Some(placeholder) = &view.placeholder {
        return format!(
            r#"<div class="leaderboard-empty">{}</div>"#,
            escape_html(placeholder)
        );
    }

    view.rows
        .iter()
        .map(|row| {
            format!(
                r#"<div class="leaderboard-item{highlight}"><div class="leaderboard-rank{top3}">{rank}</div><div class="leaderboard-info"><div class="leaderboard-name">{name}</div><div class="leaderboard-stats">{total} total check-ins</div></div><div class="leaderboard-streak">{streak}🔥</div></div>"#,
                highlight = if row.is_viewer { " highlight" } else { "" },
                top3 = if row.top3 { " top3" } else { "" },
                rank = row.rank,
                name = escape_html(&row.display_name()),
                total = row.total_completions,
                streak = row.current_streak,
            )
        })
        .collect()
}

/// Substitutes `{{KEY}}` markers in one pass; inserted values are never rescanned.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A JSON string literal that is safe inside an inline `<script>`.
fn script_string(value: Option<&str>) -> String {
    serde_json::Value::from(value.unwrap_or_default())
        .to_string()
        .replace('<', "\\u003c")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily Check-In</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(720px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1, h2 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      margin: 0;
    }

    .welcome {
      border-radius: 18px;
      padding: 16px 18px;
      border: 1px solid transparent;
    }

    .welcome.ok {
      background: rgba(34, 197, 94, 0.1);
      border-color: rgba(34, 197, 94, 0.3);
    }

    .welcome.warn {
      background: rgba(239, 68, 68, 0.1);
      border-color: rgba(239, 68, 68, 0.3);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 16px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(255, 107, 74, 0.3);
    }

    button:disabled {
      cursor: default;
      opacity: 0.6;
      box-shadow: none;
    }

    button.loading {
      opacity: 0.75;
    }

    .feedback {
      display: none;
      border-radius: 14px;
      padding: 12px 16px;
    }

    .feedback.show {
      display: block;
    }

    .feedback.info {
      background: rgba(47, 72, 88, 0.08);
    }

    .feedback.success {
      background: rgba(34, 197, 94, 0.15);
    }

    .feedback.error {
      background: rgba(239, 68, 68, 0.15);
    }

    .leaderboard {
      display: grid;
      gap: 10px;
    }

    .leaderboard-item {
      display: grid;
      grid-template-columns: 40px 1fr auto;
      align-items: center;
      gap: 12px;
      background: white;
      border-radius: 16px;
      padding: 12px 16px;
    }

    .leaderboard-item.highlight {
      border: 2px solid var(--accent);
    }

    .leaderboard-rank {
      font-weight: 600;
      color: #8b857d;
    }

    .leaderboard-rank.top3 {
      color: var(--accent);
    }

    .leaderboard-stats {
      font-size: 0.85rem;
      color: #8b857d;
    }

    .leaderboard-empty {
      color: #8b857d;
      text-align: center;
      padding: 16px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Daily Check-In</h1>
    </header>

    <section id="welcome" class="welcome {{WELCOME_TONE}}">
      <p class="welcome-message">{{WELCOME}}</p>
    </section>

    <section class="panel">
      <div class="stat">
        <span class="label">Current streak</span>
        <span class="value"><span id="current-streak">{{STREAK}}</span> 🔥</span>
      </div>
      <div class="stat">
        <span class="label">Day</span>
        <span class="value" id="day-number">{{DAY}}</span>
      </div>
      <div class="stat">
        <span class="label">Total check-ins</span>
        <span class="value" id="total-completions">{{TOTAL}}</span>
      </div>
    </section>

    <button id="checkin-button" type="button" {{BUTTON_DISABLED}}>
      <span class="button-text">{{BUTTON_LABEL}}</span>
    </button>

    <div id="feedback" class="{{FEEDBACK_CLASS}}" data-dismiss="{{FEEDBACK_DISMISS}}">{{FEEDBACK}}</div>

    <section>
      <h2>Leaderboard</h2>
      <div id="leaderboard" class="leaderboard">{{LEADERBOARD}}</div>
    </section>
  </main>

  <script>
    const identity = { name: {{NAME_JSON}}, email: {{EMAIL_JSON}} };
    const refreshMs = {{REFRESH_MS}};

    const button = document.getElementById('checkin-button');
    const buttonText = button.querySelector('.button-text');
    const feedback = document.getElementById('feedback');
    const leaderboard = document.getElementById('leaderboard');
    const streakEl = document.getElementById('current-streak');
    const dayEl = document.getElementById('day-number');
    const totalEl = document.getElementById('total-completions');

    let dismissTimer = null;
    let issued = 0;
    let applied = 0;

    const escapeHtml = (value) =>
      String(value)
        .replace(/&/g, '&amp;')
        .replace(/</g, '&lt;')
        .replace(/>/g, '&gt;')
        .replace(/"/g, '&quot;')
        .replace(/'/g, '&#39;');

    const showFeedback = (fb) => {
      clearTimeout(dismissTimer);
      feedback.textContent = fb.message;
      feedback.className = `feedback show ${fb.severity}`;
      if (fb.dismiss_after_ms) {
        dismissTimer = setTimeout(() => feedback.classList.remove('show'), fb.dismiss_after_ms);
      }
    };

    const renderStats = (stats) => {
      streakEl.textContent = stats.current_streak;
      dayEl.textContent = stats.day_number;
      totalEl.textContent = stats.total_completions;
    };

    const renderButton = (view) => {
      button.classList.remove('loading');
      button.disabled = !view.enabled;
      buttonText.textContent = view.label;
    };

    const renderLeaderboard = (view) => {
      if (view.placeholder) {
        leaderboard.innerHTML = `<div class="leaderboard-empty">${escapeHtml(view.placeholder)}</div>`;
        return;
      }
      leaderboard.innerHTML = view.rows
        .map((row) => `
          <div class="leaderboard-item${row.is_viewer ? ' highlight' : ''}">
            <div class="leaderboard-rank${row.top3 ? ' top3' : ''}">${row.rank}</div>
            <div class="leaderboard-info">
              <div class="leaderboard-name">${escapeHtml(row.name)}${row.is_viewer ? ' (You)' : ''}</div>
              <div class="leaderboard-stats">${row.total_completions} total check-ins</div>
            </div>
            <div class="leaderboard-streak">${row.current_streak}🔥</div>
          </div>`)
        .join('');
    };

    const applyLeaderboard = (seq, view) => {
      if (seq < applied) {
        return;
      }
      applied = seq;
      renderLeaderboard(view);
    };

    const refreshLeaderboard = async () => {
      const seq = ++issued;
      try {
        const res = await fetch(`/api/leaderboard?email=${encodeURIComponent(identity.email)}`);
        if (!res.ok) {
          throw new Error('leaderboard request failed');
        }
        applyLeaderboard(seq, await res.json());
      } catch (err) {
        applyLeaderboard(seq, { rows: [], placeholder: 'Failed to load leaderboard' });
      }
    };

    const checkIn = async () => {
      button.disabled = true;
      button.classList.add('loading');
      feedback.classList.remove('show');
      try {
        const res = await fetch('/api/checkin', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(identity)
        });
        if (!res.ok) {
          throw new Error((await res.text()) || 'Request failed');
        }
        const view = await res.json();
        if (view.stats) {
          renderStats(view.stats);
        }
        renderButton(view.button);
        showFeedback(view.feedback);
        if (view.leaderboard) {
          applyLeaderboard(++issued, view.leaderboard);
        }
      } catch (err) {
        renderButton({ enabled: true, label: buttonText.textContent });
        showFeedback({
          message: '❌ Failed to save check-in. Please try again.',
          severity: 'error',
          dismiss_after_ms: 5000
        });
      }
    };

    const initialDismiss = Number(feedback.dataset.dismiss);
    if (initialDismiss > 0) {
      dismissTimer = setTimeout(() => feedback.classList.remove('show'), initialDismiss);
    }

    button.addEventListener('click', () => {
      checkIn();
    });

    setInterval(refreshLeaderboard, refreshMs);
  </script>
</body>
</html>
"#;
