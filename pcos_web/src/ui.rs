use crate::presenter::{Phase, Presenter, PREDICTION_FAILED};
use crate::upload::UPLOAD_FIELD;
use pcos_prediction::Prediction;
use std::fmt::Write;

const MODEL_LOAD_FAILED: &str = "Failed to load the model. Please check if the model file exists.";

const PLACEHOLDER: &str =
    "Please upload an ultrasound image using the sidebar to begin analysis.";

const DEVELOPMENT_NOTE: &str = "<strong>Note:</strong> This model is still under development. \
Please only upload ultrasound images of the ovary for analysis. \
Uploading other types of images may result in incorrect predictions.";

const DISCLAIMER: &str = "Please note: This is an AI-based prediction and should not be used as \
a definitive medical diagnosis. Always consult with a healthcare professional for proper \
diagnosis and treatment.";

const STYLE: &str = r#"
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        display: flex;
        min-height: 100vh;
        color: #262730;
    }
    aside {
        width: 320px;
        padding: 2rem 1.5rem;
        background: #f0f2f6;
        display: flex;
        flex-direction: column;
        gap: 1rem;
    }
    main { flex: 1; max-width: 1200px; padding: 1rem 2rem; margin: 0 auto; }
    .big-title { font-size: 50px; font-weight: bold; text-align: center; padding: 20px 0; }
    .btn {
        width: 100%;
        padding: 0.6rem;
        border: 1px solid #d0d3da;
        border-radius: 8px;
        background: #ffffff;
        font-size: 1rem;
        cursor: pointer;
    }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    .note { background: #fff8e1; border-radius: 8px; padding: 0.8rem; font-size: 0.9rem; }
    .info { background: #e3f2fd; border-radius: 8px; padding: 0.8rem; font-size: 0.9rem; }
    .error { background: #fdecea; color: #8a1c12; border-radius: 8px; padding: 0.8rem; margin: 1rem auto; max-width: 470px; }
    .panel {
        text-align: center;
        padding: 2rem;
        background-color: #f0f2f6;
        border-radius: 10px;
        margin: 1rem auto;
        max-width: 470px;
    }
    .image-container {
        background-color: #ffffff;
        padding: 10px;
        border-radius: 8px;
        box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
        margin: auto;
        max-width: 470px;
        text-align: center;
    }
    .image-container img { max-width: 100%; }
    .caption { color: #808495; font-size: 0.85rem; padding-top: 0.4rem; }
    .detected { color: red; }
    .not-detected { color: green; }
"#;

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn sidebar(has_image: bool) -> String {
    let disabled = if has_image { "" } else { " disabled" };
    format!(
        r#"<aside>
    <h2>Upload Image 🖼️</h2>
    <p>Upload an ultrasound image to check for PCOS</p>
    <form action="/upload" method="post" enctype="multipart/form-data">
        <input type="file" name="{field}" accept=".jpg,.jpeg,.png,image/jpeg,image/png"
               title="Upload an ultrasound image (max 10MB)" required>
        <button class="btn" type="submit">Upload</button>
    </form>
    <form action="/analyze" method="post">
        <button class="btn" type="submit"{disabled}>Check for PCOS</button>
    </form>
    <form action="/clear" method="post">
        <button class="btn" type="submit"{disabled}>Remove image</button>
    </form>
    <div class="note">{note}</div>
    <hr>
    <div class="info">{disclaimer}</div>
</aside>"#,
        field = UPLOAD_FIELD,
        disabled = disabled,
        note = DEVELOPMENT_NOTE,
        disclaimer = DISCLAIMER,
    )
}

fn error_box(message: &str, hint: Option<&str>) -> String {
    let mut html = format!(r#"<div class="error"><p>{}</p>"#, escape(message));
    if let Some(hint) = hint {
        let _ = write!(html, "<p>{}</p>", escape(hint));
    }
    html.push_str("</div>");
    html
}

fn result_panel(prediction: &Prediction) -> String {
    let class = if prediction.diagnosis.is_detected() {
        "detected"
    } else {
        "not-detected"
    };
    format!(
        r#"<div class="panel"><h2 class="{}">{}</h2><p>Confidence: {}</p></div>"#,
        class,
        prediction.diagnosis,
        prediction.confidence_percent()
    )
}

fn main_content(presenter: &Presenter) -> String {
    let mut html = String::from(r#"<p class="big-title">🏥 PCOS Detection System 🔍</p>"#);

    if let Some(err) = presenter.load_error() {
        tracing::debug!("Rendering model load failure: {}", err);
        html.push_str(&error_box(MODEL_LOAD_FAILED, None));
        return html;
    }

    if let Some(rejection) = presenter.rejection() {
        html.push_str(&error_box(&rejection.to_string(), rejection.hint()));
    }

    let Some(loaded) = presenter.image() else {
        let _ = write!(html, r#"<div class="panel"><p>{}</p></div>"#, PLACEHOLDER);
        return html;
    };

    let _ = write!(
        html,
        r#"<div class="image-container"><img src="/preview?rev={}" alt="Uploaded Image"><p class="caption">Uploaded Image</p></div>"#,
        loaded.revision
    );

    match presenter.phase() {
        Phase::ResultReady(prediction) => html.push_str(&result_panel(prediction)),
        Phase::Failed(reason) => html.push_str(&error_box(PREDICTION_FAILED, Some(reason))),
        // Analysis runs under the presenter lock, so a page never renders mid-analysis.
        Phase::Idle | Phase::ImageLoaded | Phase::Analyzing => {}
    }

    html
}

pub fn render_page(presenter: &Presenter) -> String {
    let has_image = presenter.load_error().is_none() && presenter.image().is_some();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PCOS Detection</title>
    <style>{style}</style>
</head>
<body>
{sidebar}
<main>
{content}
</main>
</body>
</html>"#,
        style = STYLE,
        sidebar = sidebar(has_image),
        content = main_content(presenter),
    )
}
