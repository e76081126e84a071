use crate::models::QueuedImage;
use wasm_bindgen_futures::JsFuture;

/// `navigator.onLine`; assumes online when there is no window.
pub(crate) fn is_browser_online() -> bool {
    web_sys::window()
        .map(|w| w.navigator().on_line())
        .unwrap_or(true)
}

/// Read a picked file fully into memory so it can be queued.
pub(crate) async fn read_image(file: &web_sys::File) -> Result<QueuedImage, String> {
    let buf = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("could not read {}: {e:?}", file.name()))?;

    Ok(QueuedImage {
        file_name: file.name(),
        mime: file.type_(),
        bytes: js_sys::Uint8Array::new(&buf).to_vec(),
    })
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview("  short memo ", 20), "short memo");
    }

    #[test]
    fn test_preview_cuts_on_char_boundaries() {
        assert_eq!(preview("今天天气很好，出去走走", 4), "今天天气…");
        assert_eq!(preview("hello world", 6), "hello…");
    }
}
