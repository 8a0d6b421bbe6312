//! Browser surface.
//!
//! The byte builders ([`export_pdf`], [`export_spreadsheet`]) are pure and
//! return the file contents to JavaScript. [`ReportExporter`] runs the whole
//! action the console buttons trigger: optional logo fetch, build, download,
//! with a busy flag so a second click while an export is pending is refused.
//!
//! ```javascript
//! import init, { ReportExporter, init_logging } from 'inventory-reports';
//! await init();
//! init_logging('info');
//! const exporter = new ReportExporter();
//! const ok = await exporter.export('xlsx', 'inventory', json, 'active', '/assets/logo_app.png');
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::NaiveDateTime;
use wasm_bindgen::prelude::*;

use crate::config::ExportConfig;
use crate::entity::{EntityKind, StatusFilter};
use crate::error::{ExportError, Result};
use crate::logo::LogoImage;
use crate::report::{render_report, RenderedReport, ReportFormat};

fn to_js(e: &ExportError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Resolve the entity and status tab names sent by the console.
///
/// A missing filter means the "all" tab.
pub fn parse_target(entity: &str, filter: Option<&str>) -> Result<(EntityKind, StatusFilter)> {
    let kind = EntityKind::parse(entity)
        .ok_or_else(|| ExportError::Other(format!("unknown entity {entity:?}")))?;
    let filter = match filter {
        Some(name) => StatusFilter::parse(name)
            .ok_or_else(|| ExportError::Other(format!("unknown status filter {name:?}")))?,
        None => StatusFilter::All,
    };
    Ok((kind, filter))
}

fn build_bytes(
    format: ReportFormat,
    entity: &str,
    payload: &str,
    filter: Option<&str>,
    logo: Option<Vec<u8>>,
) -> Result<Vec<u8>> {
    let (kind, filter) = parse_target(entity, filter)?;
    let logo = logo.map(LogoImage::from_bytes).transpose()?;
    let report = render_report(
        format,
        kind,
        payload,
        filter,
        logo.as_ref(),
        &ExportConfig::default(),
        local_now(),
    )?;
    Ok(report.bytes)
}

/// Build the PDF listing for an API payload and return its bytes.
///
/// # Errors
/// Unknown entity or filter names, malformed payloads and undecodable logos.
#[wasm_bindgen]
pub fn export_pdf(
    entity: &str,
    payload: &str,
    filter: Option<String>,
    logo: Option<Vec<u8>>,
) -> std::result::Result<Vec<u8>, JsValue> {
    build_bytes(ReportFormat::Pdf, entity, payload, filter.as_deref(), logo).map_err(|e| to_js(&e))
}

/// Build the spreadsheet report for an API payload and return its bytes.
///
/// # Errors
/// Same as [`export_pdf`].
#[wasm_bindgen]
pub fn export_spreadsheet(
    entity: &str,
    payload: &str,
    filter: Option<String>,
    logo: Option<Vec<u8>>,
) -> std::result::Result<Vec<u8>, JsValue> {
    build_bytes(ReportFormat::Xlsx, entity, payload, filter.as_deref(), logo).map_err(|e| to_js(&e))
}

/// Install the console logger at `level` (`"error"` .. `"trace"`).
///
/// # Errors
/// Unknown level names.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> std::result::Result<(), JsValue> {
    let filter = crate::logging::parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("unknown log level {level:?}")))?;
    if let Err(e) = crate::logging::init_console_logger(filter) {
        log::debug!("{e}");
    }
    Ok(())
}

#[derive(Default)]
struct ExporterState {
    busy: Cell<bool>,
    config: ExportConfig,
    logo: RefCell<Option<LogoImage>>,
}

/// Clears the busy flag when the export ends, however it ends.
struct BusyGuard {
    state: Rc<ExporterState>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.busy.set(false);
    }
}

/// Runs console exports one at a time.
#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct ReportExporter {
    state: Rc<ExporterState>,
}

#[wasm_bindgen]
impl ReportExporter {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self::default()
    }

    /// Create an exporter with a configuration object (see `ExportConfig`).
    ///
    /// # Errors
    /// Returns an error if the object does not describe a valid configuration.
    pub fn with_config(config: JsValue) -> std::result::Result<ReportExporter, JsValue> {
        console_error_panic_hook::set_once();
        let config: ExportConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid export config: {e}")))?;
        config.validate().map_err(|e| to_js(&e))?;
        Ok(Self::with_export_config(config))
    }

    /// Use these image bytes as the logo of later exports.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a PNG or JPEG.
    pub fn set_logo(&self, bytes: Vec<u8>) -> std::result::Result<(), JsValue> {
        let logo = LogoImage::from_bytes(bytes).map_err(|e| to_js(&e))?;
        *self.state.logo.borrow_mut() = Some(logo);
        Ok(())
    }

    pub fn clear_logo(&self) {
        *self.state.logo.borrow_mut() = None;
    }

    #[must_use]
    pub fn has_logo(&self) -> bool {
        self.state.logo.borrow().is_some()
    }

    /// Whether an export is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.busy.get()
    }
}

impl ReportExporter {
    pub fn with_export_config(config: ExportConfig) -> Self {
        Self {
            state: Rc::new(ExporterState {
                config,
                ..ExporterState::default()
            }),
        }
    }

    fn acquire(&self) -> Option<BusyGuard> {
        if self.state.busy.replace(true) {
            return None;
        }
        Some(BusyGuard {
            state: Rc::clone(&self.state),
        })
    }

    /// Build one report and hand it to `deliver`.
    ///
    /// Returns `false` without building anything when another export is in
    /// progress. Build or delivery failures are logged and also give `false`.
    pub fn export_with<F>(
        &self,
        format: ReportFormat,
        kind: EntityKind,
        payload: &str,
        filter: StatusFilter,
        now: NaiveDateTime,
        deliver: F,
    ) -> bool
    where
        F: FnOnce(&RenderedReport) -> Result<()>,
    {
        let Some(_guard) = self.acquire() else {
            log::warn!("{kind:?} export ignored: another export is in progress");
            return false;
        };
        self.run(format, kind, payload, filter, None, now, deliver)
    }

    /// The export itself; the caller holds the busy guard.
    ///
    /// `fetched_logo` is the outcome of a logo requested for this export.
    /// A failed fetch fails the export before anything is built.
    #[allow(clippy::too_many_arguments)]
    fn run<F>(
        &self,
        format: ReportFormat,
        kind: EntityKind,
        payload: &str,
        filter: StatusFilter,
        fetched_logo: Option<Result<LogoImage>>,
        now: NaiveDateTime,
        deliver: F,
    ) -> bool
    where
        F: FnOnce(&RenderedReport) -> Result<()>,
    {
        match fetched_logo {
            Some(Ok(logo)) => *self.state.logo.borrow_mut() = Some(logo),
            Some(Err(e)) => {
                log::error!("{kind:?} {format:?} export failed: {e}");
                return false;
            }
            None => {}
        }
        let logo = self.state.logo.borrow();
        let outcome = render_report(
            format,
            kind,
            payload,
            filter,
            logo.as_ref(),
            &self.state.config,
            now,
        )
        .and_then(|report| deliver(&report).map(|()| report));
        match outcome {
            Ok(report) => {
                log::info!("exported {} ({} bytes)", report.filename, report.bytes.len());
                true
            }
            Err(e) => {
                log::error!("{kind:?} {format:?} export failed: {e}");
                false
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Request, RequestInit, RequestMode, Response, Url};

    use super::*;

    fn js_error(value: &JsValue) -> ExportError {
        ExportError::Other(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }

    fn window() -> Result<web_sys::Window> {
        web_sys::window().ok_or_else(|| ExportError::Other("no window object".to_string()))
    }

    /// Fetch and identify the logo at `url`; `data:` URLs are decoded in place.
    pub async fn fetch_logo(url: &str) -> Result<LogoImage> {
        if url.trim_start().starts_with("data:") {
            return LogoImage::from_data_url(url);
        }
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);
        let request = Request::new_with_str_and_init(url, &opts).map_err(|e| js_error(&e))?;
        let response: Response = JsFuture::from(window()?.fetch_with_request(&request))
            .await
            .map_err(|e| js_error(&e))?
            .dyn_into()
            .map_err(|e| js_error(&e))?;
        if !response.ok() {
            return Err(ExportError::Image(format!(
                "logo request {url} failed with HTTP {}",
                response.status()
            )));
        }
        let buffer = JsFuture::from(response.array_buffer().map_err(|e| js_error(&e))?)
            .await
            .map_err(|e| js_error(&e))?;
        LogoImage::from_bytes(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    /// Save `bytes` as `filename` through a temporary object URL.
    pub fn trigger_download(bytes: &[u8], filename: &str, mime: &str) -> Result<()> {
        let document = window()?
            .document()
            .ok_or_else(|| ExportError::Other("no document".to_string()))?;
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| js_error(&e))?;
        let url = Url::create_object_url_with_blob(&blob).map_err(|e| js_error(&e))?;
        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(|e| js_error(&e))?
            .dyn_into()
            .map_err(|_| ExportError::Other("created element is not an anchor".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.click();
        Url::revoke_object_url(&url).map_err(|e| js_error(&e))?;
        log::debug!("download of {filename} started ({} bytes, {mime})", bytes.len());
        Ok(())
    }

    #[wasm_bindgen]
    impl ReportExporter {
        /// Fetch the logo at `url` and keep it for later exports.
        ///
        /// Resolves to `true` when the logo was loaded.
        pub fn load_logo(&self, url: String) -> js_sys::Promise {
            let exporter = self.clone();
            wasm_bindgen_futures::future_to_promise(async move {
                match fetch_logo(&url).await {
                    Ok(logo) => {
                        *exporter.state.logo.borrow_mut() = Some(logo);
                        Ok(JsValue::TRUE)
                    }
                    Err(e) => {
                        log::error!("logo {url}: {e}");
                        Ok(JsValue::FALSE)
                    }
                }
            })
        }

        /// Build a report from an API payload and download it.
        ///
        /// `format` is `"pdf"` or `"xlsx"`; `filter` is the status tab
        /// (`"all"` when absent). With `logo_url` the logo is fetched first
        /// and a failed fetch fails the export. Resolves to `true` when the
        /// download started, `false` when the export was refused (another
        /// one pending) or failed.
        pub fn export(
            &self,
            format: String,
            entity: String,
            payload: String,
            filter: Option<String>,
            logo_url: Option<String>,
        ) -> js_sys::Promise {
            let exporter = self.clone();
            wasm_bindgen_futures::future_to_promise(async move {
                let Some(_guard) = exporter.acquire() else {
                    log::warn!("{entity} export ignored: another export is in progress");
                    return Ok(JsValue::FALSE);
                };
                let target = ReportFormat::parse(&format)
                    .ok_or_else(|| ExportError::Other(format!("unknown report format {format:?}")))
                    .and_then(|f| parse_target(&entity, filter.as_deref()).map(|t| (f, t)));
                let (format, (kind, filter)) = match target {
                    Ok(target) => target,
                    Err(e) => {
                        log::error!("export request rejected: {e}");
                        return Ok(JsValue::FALSE);
                    }
                };
                let fetched = match logo_url {
                    Some(url) => Some(
                        fetch_logo(&url)
                            .await
                            .map_err(|e| ExportError::Image(format!("logo {url}: {e}"))),
                    ),
                    None => None,
                };
                let delivered =
                    exporter.run(format, kind, &payload, filter, fetched, local_now(), |report| {
                        trigger_download(&report.bytes, &report.filename, report.mime_type)
                    });
                Ok(JsValue::from_bool(delivered))
            })
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{fetch_logo, trigger_download};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    const TYPES: &str = r#"{"response": [
        {"ID_TIPO_EQUIPO": 1, "NOMBRE_TIPO_EQUIPO": "Laptop", "ESTADO": "A"},
        {"ID_TIPO_EQUIPO": 2, "NOMBRE_TIPO_EQUIPO": "Impresora", "ESTADO": "I"}
    ]}"#;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("inventory", Some("inactive")).unwrap(),
            (EntityKind::Inventory, StatusFilter::Inactive)
        );
        assert_eq!(
            parse_target("tipo_equipo", None).unwrap(),
            (EntityKind::EquipmentType, StatusFilter::All)
        );
        assert!(parse_target("vehicles", None).is_err());
        assert!(parse_target("department", Some("archived")).is_err());
    }

    #[test]
    fn test_export_delivers_named_file() {
        let exporter = ReportExporter::default();
        let mut delivered = None;
        let ok = exporter.export_with(
            ReportFormat::Xlsx,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::All,
            now(),
            |report| {
                delivered = Some((report.filename.clone(), report.bytes.len()));
                Ok(())
            },
        );
        assert!(ok);
        let (name, len) = delivered.unwrap();
        assert_eq!(name, "TipodeEquipo.xlsx");
        assert!(len > 0);
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_busy_exporter_refuses_second_export() {
        let exporter = ReportExporter::default();
        let guard = exporter.acquire().unwrap();
        assert!(exporter.is_busy());
        let mut called = false;
        let ok = exporter.export_with(
            ReportFormat::Pdf,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::All,
            now(),
            |_| {
                called = true;
                Ok(())
            },
        );
        assert!(!ok);
        assert!(!called);
        drop(guard);
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_failure_resets_busy_flag() {
        let exporter = ReportExporter::default();
        let ok = exporter.export_with(
            ReportFormat::Pdf,
            EntityKind::Department,
            "not json",
            StatusFilter::All,
            now(),
            |_| Ok(()),
        );
        assert!(!ok);
        assert!(!exporter.is_busy());

        let ok = exporter.export_with(
            ReportFormat::Pdf,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::Active,
            now(),
            |_| Err(ExportError::Other("download blocked".to_string())),
        );
        assert!(!ok);
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_failed_logo_fetch_fails_the_export() {
        let exporter = ReportExporter::default();
        *exporter.state.logo.borrow_mut() = Some(crate::test_support::logo());
        let guard = exporter.acquire().unwrap();
        let mut called = false;
        let ok = exporter.run(
            ReportFormat::Pdf,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::All,
            Some(Err(ExportError::Image("logo request failed with HTTP 404".to_string()))),
            now(),
            |_| {
                called = true;
                Ok(())
            },
        );
        drop(guard);
        assert!(!ok);
        assert!(!called, "a stale logo must not stand in for the requested one");
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_fetched_logo_replaces_stored_one() {
        let exporter = ReportExporter::default();
        let fetched = LogoImage::from_bytes(crate::test_support::encode_png(2, 2, 0, &[0; 4]));
        let ok = exporter.run(
            ReportFormat::Xlsx,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::All,
            Some(fetched),
            now(),
            |_| Ok(()),
        );
        assert!(ok);
        assert_eq!(exporter.state.logo.borrow().as_ref().map(LogoImage::width), Some(2));
    }

    #[test]
    fn test_logo_is_used_by_exports() {
        let exporter = ReportExporter::default();
        let logo = crate::test_support::logo();
        *exporter.state.logo.borrow_mut() = Some(logo);
        assert!(exporter.has_logo());
        let mut pdf = Vec::new();
        assert!(exporter.export_with(
            ReportFormat::Pdf,
            EntityKind::EquipmentType,
            TYPES,
            StatusFilter::All,
            now(),
            |report| {
                pdf.clone_from(&report.bytes);
                Ok(())
            },
        ));
        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        let has_image = doc.objects.values().any(|object| {
            object
                .as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|s| s.as_name().ok())
                == Some(b"Image".as_slice())
        });
        assert!(has_image);
        exporter.clear_logo();
        assert!(!exporter.has_logo());
    }
}
