//! Server-rendered form page.
//!
//! One HTML document: eleven bounded sliders, a submit action, and a small
//! script that posts the vector to `/predict` and draws the two-bar
//! probability display. When no model is loaded the form is disabled and
//! the operator message is shown instead.

use super::AppState;
use crate::schema::{FIELDS, FieldSpec};

pub(crate) fn render(state: &AppState) -> String {
    let mut sliders = String::new();
    for (index, field) in FIELDS.iter().enumerate() {
        sliders.push_str(&slider_markup(field, index));
    }

    let (notice, fieldset_attr) = match state.model() {
        Some(_) => (String::new(), ""),
        None => {
            let reason = escape_html(&state.unavailable_reason());
            (
                format!("<p class=\"notice\">{reason}</p>"),
                " disabled",
            )
        }
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Red Wine Quality Predictor</title>
<style>
body {{ font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }}
.notice {{ color: #b00020; border: 1px solid #b00020; padding: 0.75rem; }}
.slider-grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: 0.5rem 2rem; }}
.slider label {{ display: block; font-size: 0.9rem; margin-top: 0.5rem; }}
.slider output {{ float: right; font-variant-numeric: tabular-nums; }}
.slider input {{ width: 100%; }}
#result {{ margin-top: 1.5rem; }}
.bar-row {{ display: flex; align-items: center; gap: 0.5rem; margin: 0.25rem 0; }}
.bar-label {{ width: 11rem; font-size: 0.9rem; }}
.bar {{ height: 1.1rem; background: #7b1e3b; min-width: 1px; }}
.bar.good {{ background: #2e7d32; }}
button {{ margin-top: 1rem; padding: 0.5rem 1.5rem; }}
</style>
</head>
<body>
<h1>Red Wine Quality Predictor</h1>
<p>Set the chemical measurements below and press <strong>Predict</strong>.</p>
{notice}
<form id="predict-form">
<fieldset{fieldset_attr} style="border:none;padding:0">
<div class="slider-grid">
{sliders}</div>
<button type="submit">Predict</button>
</fieldset>
</form>
<div id="result"></div>
<script>
const form = document.getElementById('predict-form');
form.addEventListener('submit', async (event) => {{
  event.preventDefault();
  const body = {{}};
  for (const input of form.querySelectorAll('input[data-name]')) {{
    body[input.dataset.name] = parseFloat(input.value);
  }}
  const result = document.getElementById('result');
  const response = await fetch('/predict', {{
    method: 'POST',
    headers: {{ 'Content-Type': 'application/json' }},
    body: JSON.stringify(body),
  }});
  if (!response.ok) {{
    const err = await response.json();
    result.innerHTML = '<p class="notice"></p>';
    result.firstChild.textContent = err.error;
    return;
  }}
  const prediction = await response.json();
  const names = ['average/low quality', 'good quality'];
  let html = '<h2>Prediction: ' + prediction.label_text + '</h2>';
  prediction.probabilities.forEach((p, i) => {{
    const pct = (p * 100).toFixed(1);
    const cls = i === 1 ? 'bar good' : 'bar';
    html += '<div class="bar-row"><span class="bar-label">' + names[i] +
      '</span><div class="' + cls + '" style="width:' + pct +
      '%"></div><span>' + pct + '%</span></div>';
  }});
  result.innerHTML = html;
}});
for (const input of form.querySelectorAll('input[data-name]')) {{
  const output = document.getElementById(input.id + '-value');
  input.addEventListener('input', () => {{ output.value = input.value; }});
}}
</script>
</body>
</html>
"#
    )
}

fn slider_markup(field: &FieldSpec, index: usize) -> String {
    format!(
        concat!(
            "<div class=\"slider\">",
            "<label for=\"f{index}\">{name}",
            "<output id=\"f{index}-value\">{default}</output></label>",
            "<input type=\"range\" id=\"f{index}\" data-name=\"{name}\" ",
            "min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{default}\">",
            "</div>\n"
        ),
        index = index,
        name = field.name,
        min = field.min,
        max = field.max,
        step = field.step,
        default = field.default,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_markup_carries_bounds_and_default() {
        let markup = slider_markup(&FIELDS[0], 0);
        assert!(markup.contains("data-name=\"fixed acidity\""));
        assert!(markup.contains("min=\"4\""));
        assert!(markup.contains("max=\"16\""));
        assert!(markup.contains("value=\"8\""));
        assert!(markup.contains("step=\"0.1\""));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(escape_html("<b>&x</b>"), "&lt;b&gt;&amp;x&lt;/b&gt;");
    }
}
