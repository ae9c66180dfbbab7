// Cross-platform file picking. On wasm we create a hidden <input type=file> and read the chosen
// file's bytes asynchronously; the app polls for them each frame. Native builds use rfd directly.

/// What the user is picking; each kind has its own pending slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickKind {
    Image,
    Regions,
}

impl PickKind {
    #[cfg(target_arch = "wasm32")]
    fn accept(self) -> &'static str {
        match self {
            Self::Image => "image/png,image/jpeg,image/webp",
            Self::Regions => "application/json,.json",
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::PickKind;
    use js_sys::Uint8Array;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use wasm_bindgen::closure::Closure;
    use web_sys::{FileReader, HtmlInputElement};

    type Picked = Option<(Vec<u8>, String)>;

    static PICKED_IMAGE: Lazy<Mutex<Picked>> = Lazy::new(|| Mutex::new(None));
    static PICKED_REGIONS: Lazy<Mutex<Picked>> = Lazy::new(|| Mutex::new(None));

    fn slot(kind: PickKind) -> &'static Mutex<Picked> {
        match kind {
            PickKind::Image => &PICKED_IMAGE,
            PickKind::Regions => &PICKED_REGIONS,
        }
    }

    pub fn open_picker(kind: PickKind) {
        log::debug!("file_picker: opening {kind:?} picker");
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return;
        };
        let Ok(input) = document.create_element("input") else {
            return;
        };
        let Ok(input) = input.dyn_into::<HtmlInputElement>() else {
            return;
        };

        input.set_type("file");
        input.set_accept(kind.accept());
        // Off-screen rather than display:none; some browsers refuse clicks on hidden inputs.
        let _ = input.set_attribute(
            "style",
            "position: fixed; left: -9999px; width: 1px; height: 1px; opacity: 0;",
        );
        if let Some(body) = document.body() {
            let _ = body.append_child(&input);
        }

        let onchange = Closure::wrap(Box::new(move |ev: web_sys::Event| {
            let Some(input) = ev
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            let Ok(reader) = FileReader::new() else {
                log::warn!("file_picker: FileReader unavailable");
                return;
            };
            let reader_in_callback = reader.clone();
            let name = file.name();
            let onload = Closure::once(Box::new(move |_e: JsValue| {
                let Ok(result) = reader_in_callback.result() else {
                    log::warn!("file_picker: reading {name} failed");
                    return;
                };
                let array = Uint8Array::new(&result);
                let mut bytes = vec![0u8; array.length() as usize];
                array.copy_to(&mut bytes[..]);
                if let Ok(mut picked) = slot(kind).lock() {
                    *picked = Some((bytes, name));
                }
            }) as Box<dyn FnOnce(_)>);
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
            let _ = reader.read_as_array_buffer(&file);
        }) as Box<dyn FnMut(_)>);

        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget(); // keep alive

        input.click();
    }

    pub fn take_picked(kind: PickKind) -> Option<(Vec<u8>, String)> {
        slot(kind).lock().ok().and_then(|mut picked| picked.take())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{open_picker, take_picked};

// Native builds open rfd dialogs directly, so these are inert.
#[cfg(not(target_arch = "wasm32"))]
pub fn open_picker(_kind: PickKind) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn take_picked(_kind: PickKind) -> Option<(Vec<u8>, String)> {
    None
}
