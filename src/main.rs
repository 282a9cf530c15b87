//! 程序入口：初始化日志、加载设置与 Slint UI，并绑定 VM 回调

use std::{cell::RefCell, path::{Path, PathBuf}, rc::Rc, sync::Arc};

use anyhow::Context;
use slint::{ComponentHandle, Image, Rgba8Pixel, SharedPixelBuffer};
use tracing_subscriber::fmt::SubscriberBuilder;

slint::include_modules!();

use manga_fanyi::{
    api::{client::HttpBackend, TranslationBackend},
    config::AppConfig,
    model::{
        data_core::{AppError, AppState},
        settings::{format_name_mapping_text, parse_name_mapping_text, SettingsForm},
        translation::{run_translation, save_download, TranslationResult},
    },
    utils::validators::ACCEPTED_EXTENSIONS,
    vm::bridge::*,
};

/// 在后台线程执行阻塞任务，完成后回到UI线程处理结果
///
/// 工作线程异常退出时回调收到 `None`。
fn run_in_background<T, F, C>(work: F, on_done: C)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
    C: FnOnce(Option<T>) + 'static,
{
    let (tx, rx) = futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(work());
    });
    if let Err(e) = slint::spawn_local(async move {
        on_done(rx.await.ok());
    }) {
        tracing::error!("无法启动异步任务: {}", e);
    }
}

/// 解码图片字节（在后台线程调用）
fn decode_rgba(bytes: &[u8]) -> Result<image::RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn to_slint_image(rgba: &image::RgbaImage) -> Image {
    let buffer = SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(rgba.as_raw(), rgba.width(), rgba.height());
    Image::from_rgba8(buffer)
}

/// VM桥接器：管理UI与数据层的交互
struct ViewModelBridge {
    app_state: Rc<RefCell<AppState>>,
    backend: Arc<HttpBackend>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, app_state: Rc<RefCell<AppState>>, backend: Arc<HttpBackend>) -> Self {
        let bridge = Self { app_state, backend };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        let app_state = self.app_state.clone();

        // === 选择图片 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_select_image(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_select_image(&app_window, &app_state);
                }
            });
        }

        // === 清除图片 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_clear_image(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    if app_state.borrow_mut().clear_image().is_ok() {
                        app_window.set_preview_image(Image::default());
                        app_window.set_result_image(Image::default());
                    }
                    Self::refresh(&app_window, &app_state);
                }
            });
        }

        // === 开始翻译 ===
        {
            let app_state = app_state.clone();
            let backend = self.backend.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_start_translation(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_start_translation(&app_window, &app_state, &backend);
                }
            });
        }

        // === 下载结果 ===
        {
            let app_state = app_state.clone();
            let backend = self.backend.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_download_result(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_download_result(&app_window, &app_state, &backend);
                }
            });
        }

        // === 清除结果 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_clear_result(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    if app_state.borrow_mut().clear_result().is_ok() {
                        app_window.set_result_image(Image::default());
                    }
                    Self::refresh(&app_window, &app_state);
                }
            });
        }

        // === 设置页 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_save_settings(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_save_settings(&app_window, &app_state);
                }
            });
        }
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_add_mapping(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_add_mapping(&app_window, &app_state);
                }
            });
        }
        {
            let app_window_weak = app_window.as_weak();
            app_window.on_clear_settings(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    {
                        let mut state = app_state.borrow_mut();
                        state.settings.clear_settings();
                        state.toasts.info(STATUS_SETTINGS_CLEARED);
                    }
                    Self::load_settings_form(&app_window, &app_state);
                    Self::refresh(&app_window, &app_state);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow, config: &AppConfig) {
        app_window.set_app_name(config.app_name.as_str().into());
        app_window.set_current_page(PAGE_TRANSLATE);
        Self::load_settings_form(app_window, &self.app_state);
        Self::refresh(app_window, &self.app_state);
        if !self.app_state.borrow().settings.has_api_key() {
            app_window.set_current_page(PAGE_SETTINGS);
        }
    }

    /// 同步流程状态、设置摘要与通知到UI
    fn refresh(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let mut state = app_state.borrow_mut();

        app_window.set_has_image(state.image().is_some());
        app_window.set_image_name(
            state.image().map(|i| i.file.name.clone()).unwrap_or_default().into(),
        );
        app_window.set_translating(state.is_translating());
        app_window.set_has_result(state.result().is_some());
        if let Some(result) = state.result() {
            app_window.set_result_filename(result.filename.as_str().into());
            app_window.set_result_time(result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().into());
        }
        app_window.set_has_api_key(state.settings.has_api_key());
        app_window.set_masked_api_key(mask_api_key(state.settings.api_key()).into());
        app_window.set_status_message(status_for(state.flow_state()).into());

        if let Some(toast) = state.toasts.drain_merged() {
            app_window.set_toast_kind(toast.kind.as_str().into());
            app_window.set_toast_text(toast.message.into());
            app_window.set_toast_visible(true);
        }
    }

    /// 显示文件选择对话框
    fn show_image_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("图片文件", &ACCEPTED_EXTENSIONS)
            .set_title("选择要翻译的漫画图片")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    fn handle_select_image(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let Some(path) = Self::show_image_dialog() else {
            return;
        };

        let load_result = app_state.borrow_mut().upload_path(&path);
        if load_result.is_ok() {
            app_window.set_result_image(Image::default());
            let preview = app_state
                .borrow()
                .image()
                .map(|img| img.preview.path().to_path_buf());
            if let Some(preview) = preview {
                Self::show_preview(app_window, &preview);
            }
        }
        Self::refresh(app_window, app_state);
    }

    /// 从预览文件加载显示图片
    fn show_preview(app_window: &AppWindow, preview: &Path) {
        let decoded = std::fs::read(preview)
            .map_err(|e| e.to_string())
            .and_then(|bytes| decode_rgba(&bytes).map_err(|e| e.to_string()));
        match decoded {
            Ok(rgba) => app_window.set_preview_image(to_slint_image(&rgba)),
            Err(e) => {
                tracing::warn!("预览解码失败 {}: {}", preview.display(), e);
                app_window.set_preview_image(Image::default());
            }
        }
    }

    fn handle_start_translation(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        backend: &Arc<HttpBackend>,
    ) {
        let job = app_state.borrow_mut().begin_translation();
        Self::refresh(app_window, app_state);
        let Ok(job) = job else {
            return;
        };
        // 旧结果已被清除，不能继续显示它的图片
        app_window.set_result_image(Image::default());

        let worker_backend = backend.clone();
        let backend = backend.clone();
        let app_state = app_state.clone();
        let app_window_weak = app_window.as_weak();
        run_in_background(
            move || run_translation(worker_backend.as_ref(), job),
            move |outcome| {
                let outcome = outcome
                    .unwrap_or_else(|| Err(AppError::State("翻译任务异常退出".into())));
                let result = outcome.as_ref().ok().cloned();
                app_state.borrow_mut().finish_translation(outcome);

                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::refresh(&app_window, &app_state);
                    if let Some(result) = result {
                        Self::load_result_image(&app_window, &app_state, &backend, result);
                    }
                }
            },
        );
    }

    /// 后台获取并解码翻译后的图片
    ///
    /// 加载完成时若该结果已被清除或替换，则丢弃图片。
    fn load_result_image(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        backend: &Arc<HttpBackend>,
        result: TranslationResult,
    ) {
        let backend = backend.clone();
        let url = result.image_url.clone();
        let app_state = app_state.clone();
        let app_window_weak = app_window.as_weak();
        run_in_background(
            move || -> Result<image::RgbaImage, String> {
                let bytes = backend.fetch_image(&url).map_err(|e| e.to_string())?;
                decode_rgba(&bytes).map_err(|e| e.to_string())
            },
            move |decoded| {
                let Some(app_window) = app_window_weak.upgrade() else {
                    return;
                };
                if !app_state.borrow().is_current_result(&result) {
                    tracing::info!("结果已过期，丢弃图片: {}", result.image_url);
                    return;
                }
                match decoded {
                    Some(Ok(rgba)) => app_window.set_result_image(to_slint_image(&rgba)),
                    Some(Err(e)) => {
                        tracing::warn!("结果图片加载失败: {}", e);
                        app_window.set_result_image(Image::default());
                        app_window.set_status_message(format!("{}结果图片加载失败: {}", STATUS_ERROR_PREFIX, e).into());
                    }
                    None => tracing::error!("结果图片加载任务异常退出"),
                }
            },
        );
    }

    fn handle_download_result(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        backend: &Arc<HttpBackend>,
    ) {
        let Some(filename) = app_state.borrow().result().map(|r| r.filename.clone()) else {
            return;
        };

        let Some(dest) = rfd::FileDialog::new()
            .set_title("保存翻译结果")
            .set_file_name(filename.as_str())
            .save_file()
        else {
            tracing::info!("用户取消了保存");
            return;
        };

        app_window.set_status_message(STATUS_DOWNLOADING.into());
        let backend = backend.clone();
        let app_state = app_state.clone();
        let app_window_weak = app_window.as_weak();
        let worker_filename = filename.clone();
        run_in_background(
            move || save_download(backend.as_ref(), &worker_filename, &dest),
            move |outcome| {
                let outcome = outcome.unwrap_or_else(|| Err(AppError::State("下载任务异常退出".into())));
                let _ = app_state.borrow_mut().report_download(&filename, outcome);
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::refresh(&app_window, &app_state);
                }
            },
        );
    }

    /// 将当前设置填入设置页表单
    fn load_settings_form(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let state = app_state.borrow();
        app_window.set_api_key_input(state.settings.api_key().into());
        app_window.set_global_prompt_input(state.settings.global_prompt().into());
        app_window.set_name_mapping_text(format_name_mapping_text(state.settings.name_mapping()).into());
    }

    fn handle_save_settings(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let form = SettingsForm {
            api_key: app_window.get_api_key_input().to_string(),
            global_prompt: Some(app_window.get_global_prompt_input().to_string()),
        };
        let mapping = parse_name_mapping_text(&app_window.get_name_mapping_text());
        let saved = {
            let mut state = app_state.borrow_mut();
            match state.settings.apply_form(form) {
                Ok(()) => {
                    state.settings.update_name_mapping(mapping);
                    tracing::info!("设置已保存，对照表 {} 条", state.settings.name_mapping().len());
                    state.toasts.success(STATUS_SETTINGS_SAVED);
                    true
                }
                Err(AppError::State(message)) => {
                    state.toasts.error(message);
                    false
                }
                Err(e) => {
                    state.toasts.error(e.to_string());
                    false
                }
            }
        };
        // 保存被拒绝时保留用户已输入的表单内容
        if saved {
            Self::load_settings_form(app_window, app_state);
        }
        Self::refresh(app_window, app_state);
    }

    fn handle_add_mapping(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let original = app_window.get_mapping_original().trim().to_string();
        let translation = app_window.get_mapping_translation().trim().to_string();
        if original.is_empty() || translation.is_empty() {
            app_state.borrow_mut().toasts.warning("请填写原文与译文");
            Self::refresh(app_window, app_state);
            return;
        }

        app_state
            .borrow_mut()
            .settings
            .add_name_mapping(original.as_str(), translation.as_str());
        app_window.set_mapping_original("".into());
        app_window.set_mapping_translation("".into());
        app_window.set_name_mapping_text(
            format_name_mapping_text(app_state.borrow().settings.name_mapping()).into(),
        );
        app_state.borrow_mut().toasts.success(format!("已添加: {original}={translation}"));
        Self::refresh(app_window, app_state);
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let config = AppConfig::from_env();
    tracing::info!("API 地址: {}，超时: {:?}", config.api_base_url, config.timeout);

    let backend = Arc::new(HttpBackend::new(config.clone()).context("HTTP 客户端初始化失败")?);
    let state = Rc::new(RefCell::new(AppState::load(&config)));

    let app = AppWindow::new().context("UI 初始化失败")?;

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, state.clone(), backend);
    bridge.initialize_ui(&app, &config);

    tracing::info!("应用启动成功，UI已初始化");
    app.run().context("事件循环异常退出")?;
    Ok(())
}
