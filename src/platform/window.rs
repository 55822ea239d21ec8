//! Editor host window
//!
//! One top-level window holds the canvas on the left and the interaction
//! list on the right. Canvas pixels come from [`SceneRenderer`] and are
//! blitted with `SetDIBitsToDevice`; pointer and key messages are forwarded
//! to the [`EditorController`].

#![allow(unsafe_op_in_unsafe_fn)]

use std::ffi::c_void;

use windows::Win32::Foundation::{
    GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BeginPaint, ClientToScreen, CreateSolidBrush,
    DEFAULT_GUI_FONT, DIB_RGB_COLORS, DeleteObject, EndPaint, GetStockObject, HBRUSH, HDC,
    HGDIOBJ, InvalidateRect, PAINTSTRUCT, SetBkColor, SetDIBitsToDevice, SetTextColor,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetCapture, GetKeyState, ReleaseCapture, SetCapture, SetFocus, VK_CONTROL,
};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{PCWSTR, w};

use crate::app::controller::{AppError, EditorController};
use crate::app::interactions::InteractionManager;
use crate::domain::core::Rect;
use crate::domain::model::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::input::{EditorCommand, Modifiers, point_from_lparam};
use crate::platform::win32::{CLASS_ALREADY_EXISTS_ERR, colorref, to_wstring};
use crate::ui::prompt_dialog::Win32Shell;
use crate::ui::renderer::{SceneRenderer, pixmap_to_bgra};
use crate::ui::theme::Rgb;

pub const APP_TITLE: &str = "seqdraw";

const WINDOW_CLASS: PCWSTR = w!("SeqdrawEditorWindow");
const LIST_WIDTH: i32 = 300;
const ID_INTERACTION_LIST: i32 = 1001;

const HELP_TEXT: &str =
    "A add actor | N draw interaction | E edit label | S/D style | Up/Down reorder | Del delete | T theme | Ctrl+E export";

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to register editor window class")]
    ClassRegistrationFailed,

    #[error("Failed to create editor window")]
    WindowCreationFailed,

    #[error("Windows API error: {0}")]
    Win32Error(String),
}

type Controller = EditorController<Win32Shell>;

struct WindowState {
    hwnd: HWND,
    list: HWND,
    controller: Controller,
    renderer: SceneRenderer,
    list_brush: HBRUSH,
    list_brush_color: Option<Rgb>,
}

/// Opens the editor window and runs the message loop until it closes
pub fn run(controller: Controller, renderer: SceneRenderer) -> Result<(), WindowError> {
    // Real pixels, so the capture fallback sees the same coordinates as the window
    if let Err(err) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) } {
        tracing::warn!(error = ?err, "could not enable per-monitor DPI awareness");
    }

    let state = WindowState {
        hwnd: HWND(0),
        list: HWND(0),
        controller,
        renderer,
        list_brush: HBRUSH(0),
        list_brush_color: None,
    };
    let state_ptr = Box::into_raw(Box::new(state));

    unsafe {
        if let Err(err) = create_editor_window(state_ptr) {
            let _ = Box::from_raw(state_ptr);
            return Err(err);
        }
        ShowWindow((*state_ptr).hwnd, SW_SHOW);
        (*state_ptr).controller.shell_mut().status(HELP_TEXT);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    let state = unsafe { Box::from_raw(state_ptr) };
    if state.list_brush.0 != 0 {
        unsafe {
            DeleteObject(HGDIOBJ(state.list_brush.0));
        }
    }
    tracing::info!("editor window closed");
    Ok(())
}

fn create_editor_window(state_ptr: *mut WindowState) -> Result<(), WindowError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;
        let instance: HINSTANCE = module.into();
        register_window_class(instance)?;

        let style = WS_OVERLAPPEDWINDOW;
        let mut frame = RECT {
            left: 0,
            top: 0,
            right: CANVAS_WIDTH + LIST_WIDTH,
            bottom: CANVAS_HEIGHT,
        };
        let _ = AdjustWindowRectEx(&mut frame, style, false, WINDOW_EX_STYLE(0));

        let title = to_wstring(APP_TITLE);
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WINDOW_CLASS,
            PCWSTR(title.as_ptr()),
            style,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            frame.right - frame.left,
            frame.bottom - frame.top,
            None,
            None,
            instance,
            Some(state_ptr as *const _ as *mut _),
        );

        if hwnd.0 == 0 {
            return Err(WindowError::WindowCreationFailed);
        }

        (*state_ptr).hwnd = hwnd;
        Ok(())
    }
}

fn register_window_class(instance: HINSTANCE) -> Result<(), WindowError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW | CS_DBLCLKS,
            lpfnWndProc: Some(editor_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };

        if RegisterClassW(&wnd_class) == 0 {
            match GetLastError() {
                Err(err) if err.code() == CLASS_ALREADY_EXISTS_ERR.to_hresult() => {}
                _ => return Err(WindowError::ClassRegistrationFailed),
            }
        }
    }

    Ok(())
}

unsafe extern "system" fn editor_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
            if let Some(state) = window_state_mut(hwnd) {
                state.hwnd = hwnd;
                state.controller.shell_mut().set_owner(hwnd);
                state.create_list();
                state.refresh_list();
            }
            LRESULT(0)
        }
        WM_SIZE => {
            if let Some(state) = window_state_mut(hwnd) {
                let width = (lparam.0 & 0xFFFF) as i32;
                let height = ((lparam.0 >> 16) & 0xFFFF) as i32;
                state.layout(width, height);
            }
            LRESULT(0)
        }
        WM_MOVE => {
            if let Some(state) = window_state_mut(hwnd) {
                state.update_screen_region();
            }
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            if let Some(state) = window_state_mut(hwnd) {
                state.paint(hdc);
            }
            EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        WM_LBUTTONDOWN => {
            SetFocus(hwnd);
            SetCapture(hwnd);
            if let Some(state) = window_state_mut(hwnd) {
                let result = state.controller.pointer_down(point_from_lparam(lparam.0));
                state.handle(result);
            }
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            if GetCapture() == hwnd {
                if let Some(state) = window_state_mut(hwnd) {
                    let result = state.controller.pointer_move(point_from_lparam(lparam.0));
                    state.handle(result);
                }
            }
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            let _ = ReleaseCapture();
            if let Some(state) = window_state_mut(hwnd) {
                let result = state.controller.pointer_up(point_from_lparam(lparam.0));
                state.handle(result);
            }
            LRESULT(0)
        }
        WM_LBUTTONDBLCLK => {
            if let Some(state) = window_state_mut(hwnd) {
                let result = state.controller.double_click(point_from_lparam(lparam.0));
                state.handle(result);
            }
            LRESULT(0)
        }
        WM_KEYDOWN => {
            let modifiers = Modifiers {
                ctrl: GetKeyState(VK_CONTROL.0 as i32) < 0,
            };
            match EditorCommand::from_vk_code(wparam.0 as u32, modifiers) {
                Some(command) => {
                    if let Some(state) = window_state_mut(hwnd) {
                        let result = state.controller.execute(command);
                        state.handle(result);
                    }
                    LRESULT(0)
                }
                None => DefWindowProcW(hwnd, msg, wparam, lparam),
            }
        }
        WM_COMMAND => {
            let command_id = (wparam.0 & 0xFFFF) as i32;
            let notify_code = ((wparam.0 >> 16) & 0xFFFF) as u16;
            if command_id == ID_INTERACTION_LIST && notify_code == LBN_SELCHANGE as u16 {
                if let Some(state) = window_state_mut(hwnd) {
                    state.select_from_list();
                }
                SetFocus(hwnd);
            }
            LRESULT(0)
        }
        WM_CTLCOLORLISTBOX => match window_state_mut(hwnd) {
            Some(state) => state.color_list(HDC(wparam.0 as isize)),
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        },
        WM_DESTROY => {
            if let Some(state) = window_state_mut(hwnd) {
                state.hwnd = HWND(0);
            }
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn window_state_mut(hwnd: HWND) -> Option<&'static mut WindowState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowState;
    if ptr.is_null() { None } else { Some(&mut *ptr) }
}

impl WindowState {
    fn create_list(&mut self) {
        let style = WS_CHILD.0 | WS_VISIBLE.0 | WS_VSCROLL.0 | WS_BORDER.0 | (LBS_NOTIFY as u32);
        unsafe {
            self.list = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("LISTBOX"),
                PCWSTR::null(),
                WINDOW_STYLE(style),
                CANVAS_WIDTH,
                0,
                LIST_WIDTH,
                CANVAS_HEIGHT,
                self.hwnd,
                HMENU(ID_INTERACTION_LIST as isize),
                None,
                None,
            );
            let font = GetStockObject(DEFAULT_GUI_FONT);
            SendMessageW(self.list, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
        }
    }

    fn layout(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            self.controller.set_screen_region(None);
            return;
        }
        let canvas_width = (width - LIST_WIDTH).max(1);
        self.controller.resize(canvas_width, height);
        unsafe {
            let _ = MoveWindow(self.list, canvas_width, 0, LIST_WIDTH, height, true);
        }
        self.update_screen_region();
        self.invalidate();
    }

    /// Keeps the capture fallback pointed at the canvas's current screen position
    fn update_screen_region(&mut self) {
        let region = unsafe {
            if IsIconic(self.hwnd).as_bool() || !IsWindowVisible(self.hwnd).as_bool() {
                None
            } else {
                let mut origin = POINT { x: 0, y: 0 };
                ClientToScreen(self.hwnd, &mut origin);
                let diagram = self.controller.diagram();
                Some(Rect::new(origin.x, origin.y, diagram.width(), diagram.height()))
            }
        };
        self.controller.set_screen_region(region);
    }

    fn paint(&mut self, hdc: HDC) {
        let scene = self.controller.scene();
        let pixmap = match self.renderer.render(&scene) {
            Ok(pixmap) => pixmap,
            Err(err) => {
                tracing::error!(error = %err, "failed to render canvas");
                return;
            }
        };
        let bgra = pixmap_to_bgra(&pixmap);
        let (width, height) = (pixmap.width(), pixmap.height());

        let mut bitmap_info = BITMAPINFO::default();
        bitmap_info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            biHeight: -(height as i32), // top-down rows
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };

        unsafe {
            SetDIBitsToDevice(
                hdc,
                0,
                0,
                width,
                height,
                0,
                0,
                0,
                height,
                bgra.as_ptr() as *const c_void,
                &bitmap_info,
                DIB_RGB_COLORS,
            );
        }
    }

    /// Repaints after a successful change; reports failures in a dialog
    fn handle(&mut self, result: Result<bool, AppError>) {
        match result {
            Ok(true) => {
                self.refresh_list();
                self.invalidate();
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!(error = %err, "editor operation failed");
                self.controller.shell_mut().error(APP_TITLE, &err.to_string());
            }
        }
    }

    fn refresh_list(&mut self) {
        if self.list.0 == 0 {
            return;
        }
        unsafe {
            SendMessageW(self.list, LB_RESETCONTENT, WPARAM(0), LPARAM(0));
            for entry in self.controller.interaction_entries() {
                let wide = to_wstring(&entry);
                SendMessageW(self.list, LB_ADDSTRING, WPARAM(0), LPARAM(wide.as_ptr() as isize));
            }
            let selected = self
                .controller
                .diagram()
                .interactions()
                .selected()
                .map_or(usize::MAX, |index| index);
            SendMessageW(self.list, LB_SETCURSEL, WPARAM(selected), LPARAM(0));
        }
    }

    fn select_from_list(&mut self) {
        let index = unsafe { SendMessageW(self.list, LB_GETCURSEL, WPARAM(0), LPARAM(0)).0 };
        if index < 0 {
            return;
        }
        let result = InteractionManager::new(self.controller.diagram_mut())
            .select(index as usize)
            .map(|_| true)
            .map_err(AppError::from);
        self.handle(result);
    }

    fn color_list(&mut self, hdc: HDC) -> LRESULT {
        let palette = self.controller.palette();
        if self.list_brush_color != Some(palette.card_bg) {
            unsafe {
                if self.list_brush.0 != 0 {
                    DeleteObject(HGDIOBJ(self.list_brush.0));
                }
                self.list_brush = CreateSolidBrush(colorref(palette.card_bg));
            }
            self.list_brush_color = Some(palette.card_bg);
        }
        unsafe {
            SetTextColor(hdc, colorref(palette.text_fg));
            SetBkColor(hdc, colorref(palette.card_bg));
        }
        LRESULT(self.list_brush.0)
    }

    fn invalidate(&self) {
        unsafe {
            InvalidateRect(self.hwnd, None, false);
            if self.list.0 != 0 {
                InvalidateRect(self.list, None, true);
            }
        }
    }
}
