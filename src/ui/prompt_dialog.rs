//! Win32 implementation of the editor's dialogs
//!
//! Text and choice prompts are small modal windows built from raw Win32
//! controls. While one is open the owner window is disabled and a local
//! message loop runs until the user confirms or cancels.

#![allow(unsafe_op_in_unsafe_fn)]

use std::thread;
use std::time::Duration;

use windows::Win32::Foundation::{
    GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM,
};
use windows::Win32::Graphics::Dwm::DwmFlush;
use windows::Win32::Graphics::Gdi::{
    CreateSolidBrush, DEFAULT_GUI_FONT, DeleteObject, FillRect, GetStockObject, HBRUSH, HDC,
    HFONT, HGDIOBJ, HRGN, InvalidateRect, RDW_ALLCHILDREN, RDW_INVALIDATE, RDW_UPDATENOW,
    RedrawWindow, SetBkColor, SetTextColor,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{EnableWindow, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{PCWSTR, w};

use crate::platform::win32::{CLASS_ALREADY_EXISTS_ERR, colorref, to_wstring};
use crate::ui::shell::UiShell;
use crate::ui::theme::{Palette, Theme};

const DIALOG_CLASS: PCWSTR = w!("SeqdrawPromptDialog");
const DIALOG_WIDTH: i32 = 400;
const MARGIN: i32 = 16;
const BUTTON_WIDTH: i32 = 96;
const BUTTON_HEIGHT: i32 = 28;
const PROMPT_HEIGHT: i32 = 36;
const EDIT_HEIGHT: i32 = 24;

const ID_OK: i32 = 1;
const ID_CANCEL: i32 = 2;
const ID_EDIT: i32 = 100;
const ID_CHOICE_BASE: i32 = 200;

/// Dialogs and theming for the Win32 editor window
pub struct Win32Shell {
    owner: HWND,
    palette: Palette,
    app_title: String,
}

impl Win32Shell {
    pub fn new(app_title: &str) -> Self {
        Self {
            owner: HWND(0),
            palette: Palette::default(),
            app_title: app_title.to_string(),
        }
    }

    /// Window that owns dialogs and shows status text in its caption
    pub fn set_owner(&mut self, owner: HWND) {
        self.owner = owner;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn message_box(&self, title: &str, message: &str, style: MESSAGEBOX_STYLE) {
        let title = to_wstring(title);
        let message = to_wstring(message);
        unsafe {
            MessageBoxW(
                self.owner,
                PCWSTR(message.as_ptr()),
                PCWSTR(title.as_ptr()),
                style,
            );
        }
    }

    fn run_prompt(&self, title: &str, prompt: &str, kind: PromptKind) -> DialogResult {
        let state = PromptState::new(prompt, kind, self.palette);
        let state_ptr = Box::into_raw(Box::new(state));

        unsafe {
            if let Err(err) = create_prompt_window(state_ptr, self.owner, title) {
                let _ = Box::from_raw(state_ptr);
                tracing::error!(error = %err, "failed to open dialog");
                return DialogResult::Cancelled;
            }
            if self.owner.0 != 0 {
                EnableWindow(self.owner, false);
            }
            ShowWindow((*state_ptr).hwnd, SW_SHOW);
            let _ = SetForegroundWindow((*state_ptr).hwnd);
            if (*state_ptr).edit.0 != 0 {
                SetFocus((*state_ptr).edit);
                SendMessageW((*state_ptr).edit, EM_SETSEL, WPARAM(0), LPARAM(-1));
            }
        }

        run_modal_loop(state_ptr);

        let state = unsafe { Box::from_raw(state_ptr) };
        unsafe {
            if self.owner.0 != 0 {
                EnableWindow(self.owner, true);
                let _ = SetForegroundWindow(self.owner);
            }
            DeleteObject(HGDIOBJ(state.brush.0));
        }
        state.result
    }
}

impl UiShell for Win32Shell {
    fn ask_text(&mut self, title: &str, prompt: &str, initial: &str) -> Option<String> {
        match self.run_prompt(title, prompt, PromptKind::Text(initial.to_string())) {
            DialogResult::Text(text) => Some(text),
            _ => None,
        }
    }

    fn ask_choice(&mut self, title: &str, prompt: &str, options: &[&str]) -> Option<usize> {
        let options = options.iter().map(|o| o.to_string()).collect();
        match self.run_prompt(title, prompt, PromptKind::Choice(options)) {
            DialogResult::Choice(index) => Some(index),
            _ => None,
        }
    }

    fn info(&mut self, title: &str, message: &str) {
        self.message_box(title, message, MB_OK | MB_ICONINFORMATION);
    }

    fn error(&mut self, title: &str, message: &str) {
        self.message_box(title, message, MB_OK | MB_ICONWARNING);
    }

    fn status(&mut self, message: &str) {
        tracing::info!(message, "status");
        if self.owner.0 == 0 {
            return;
        }
        let caption = to_wstring(&format!("{} - {}", self.app_title, message));
        unsafe {
            let _ = SetWindowTextW(self.owner, PCWSTR(caption.as_ptr()));
        }
    }

    fn before_capture(&mut self) {
        if self.owner.0 == 0 {
            return;
        }
        unsafe {
            // Paint over whatever the closed prompt left behind, synchronously
            let _ = RedrawWindow(
                self.owner,
                None,
                HRGN::default(),
                RDW_INVALIDATE | RDW_UPDATENOW | RDW_ALLCHILDREN,
            );
            // Wait until the compositor has presented that frame
            if let Err(err) = DwmFlush() {
                tracing::debug!(error = %err, "compositor flush failed");
            }
        }
    }

    fn apply_theme(&mut self, theme: Theme, palette: &Palette) {
        tracing::debug!(%theme, "applying theme to window chrome");
        self.palette = *palette;
        if self.owner.0 != 0 {
            unsafe {
                InvalidateRect(self.owner, None, true);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Failed to register dialog window class")]
    ClassRegistrationFailed,
    #[error("Failed to create dialog window")]
    WindowCreationFailed,
    #[error("Windows API error: {0}")]
    Win32Error(String),
}

enum PromptKind {
    Text(String),
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogResult {
    Pending,
    Text(String),
    Choice(usize),
    Cancelled,
}

struct PromptState {
    hwnd: HWND,
    edit: HWND,
    prompt: String,
    kind: PromptKind,
    palette: Palette,
    brush: HBRUSH,
    font: HFONT,
    result: DialogResult,
}

impl PromptState {
    fn new(prompt: &str, kind: PromptKind, palette: Palette) -> Self {
        let (brush, font) = unsafe {
            (
                CreateSolidBrush(colorref(palette.card_bg)),
                HFONT(GetStockObject(DEFAULT_GUI_FONT).0),
            )
        };
        Self {
            hwnd: HWND(0),
            edit: HWND(0),
            prompt: prompt.to_string(),
            kind,
            palette,
            brush,
            font,
            result: DialogResult::Pending,
        }
    }

    fn client_height(&self) -> i32 {
        let body = match &self.kind {
            PromptKind::Text(_) => EDIT_HEIGHT + MARGIN,
            PromptKind::Choice(_) => 0,
        };
        MARGIN + PROMPT_HEIGHT + body + BUTTON_HEIGHT + MARGIN
    }

    fn build_controls(&mut self) {
        let inner_width = DIALOG_WIDTH - MARGIN * 2;
        create_control(
            self.hwnd,
            self.font,
            w!("STATIC"),
            &self.prompt,
            WS_CHILD | WS_VISIBLE,
            (MARGIN, MARGIN, inner_width, PROMPT_HEIGHT),
            0,
        );

        let buttons_y = self.client_height() - MARGIN - BUTTON_HEIGHT;
        match &self.kind {
            PromptKind::Text(initial) => {
                let edit_style = WS_CHILD.0 | WS_VISIBLE.0 | WS_BORDER.0 | WS_TABSTOP.0 | (ES_AUTOHSCROLL as u32);
                self.edit = create_control(
                    self.hwnd,
                    self.font,
                    w!("EDIT"),
                    initial,
                    WINDOW_STYLE(edit_style),
                    (MARGIN, MARGIN + PROMPT_HEIGHT, inner_width, EDIT_HEIGHT),
                    ID_EDIT,
                );
                let ok_x = DIALOG_WIDTH - MARGIN - BUTTON_WIDTH * 2 - 8;
                create_button(self.hwnd, self.font, "OK", ok_x, buttons_y, ID_OK, true);
            }
            PromptKind::Choice(options) => {
                for (index, option) in options.iter().enumerate() {
                    let x = MARGIN + index as i32 * (BUTTON_WIDTH + 8);
                    create_button(
                        self.hwnd,
                        self.font,
                        option,
                        x,
                        buttons_y,
                        ID_CHOICE_BASE + index as i32,
                        index == 0,
                    );
                }
            }
        }

        let cancel_x = DIALOG_WIDTH - MARGIN - BUTTON_WIDTH;
        create_button(self.hwnd, self.font, "Cancel", cancel_x, buttons_y, ID_CANCEL, false);
    }

    fn handle_command(&mut self, wparam: WPARAM) {
        let command_id = (wparam.0 & 0xFFFF) as i32;
        match command_id {
            ID_OK => {
                if matches!(self.kind, PromptKind::Text(_)) {
                    self.close(DialogResult::Text(read_control_text(self.edit)));
                }
            }
            ID_CANCEL => self.close(DialogResult::Cancelled),
            id if id >= ID_CHOICE_BASE => {
                let index = (id - ID_CHOICE_BASE) as usize;
                if matches!(&self.kind, PromptKind::Choice(options) if index < options.len()) {
                    self.close(DialogResult::Choice(index));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, result: DialogResult) {
        self.result = result;
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }

    fn color_control(&self, hdc: HDC) -> LRESULT {
        unsafe {
            SetTextColor(hdc, colorref(self.palette.text_fg));
            SetBkColor(hdc, colorref(self.palette.card_bg));
        }
        LRESULT(self.brush.0)
    }
}

fn create_prompt_window(
    state_ptr: *mut PromptState,
    owner: HWND,
    title: &str,
) -> Result<(), DialogError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| DialogError::Win32Error(format!("{:?}", e)))?;
        let instance: HINSTANCE = module.into();
        register_dialog_class(instance)?;

        let style = WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU;
        let ex_style = WS_EX_DLGMODALFRAME | WS_EX_CONTROLPARENT;
        let mut frame = RECT {
            left: 0,
            top: 0,
            right: DIALOG_WIDTH,
            bottom: (*state_ptr).client_height(),
        };
        let _ = AdjustWindowRectEx(&mut frame, style, false, ex_style);
        let (width, height) = (frame.right - frame.left, frame.bottom - frame.top);
        let (x, y) = centered_over(owner, width, height);

        let title = to_wstring(title);
        let hwnd = CreateWindowExW(
            ex_style,
            DIALOG_CLASS,
            PCWSTR(title.as_ptr()),
            style,
            x,
            y,
            width,
            height,
            owner,
            None,
            instance,
            Some(state_ptr as *const _ as *mut _),
        );

        if hwnd.0 == 0 {
            return Err(DialogError::WindowCreationFailed);
        }

        (*state_ptr).hwnd = hwnd;
        Ok(())
    }
}

fn register_dialog_class(instance: HINSTANCE) -> Result<(), DialogError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(prompt_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: DIALOG_CLASS,
            ..Default::default()
        };

        if RegisterClassW(&wnd_class) == 0 {
            match GetLastError() {
                Err(err) if err.code() == CLASS_ALREADY_EXISTS_ERR.to_hresult() => {}
                _ => return Err(DialogError::ClassRegistrationFailed),
            }
        }
    }

    Ok(())
}

fn centered_over(owner: HWND, width: i32, height: i32) -> (i32, i32) {
    let mut rect = RECT::default();
    let has_owner = owner.0 != 0 && unsafe { GetWindowRect(owner, &mut rect) }.is_ok();
    if !has_owner {
        return (CW_USEDEFAULT, CW_USEDEFAULT);
    }
    (
        rect.left + (rect.right - rect.left - width) / 2,
        rect.top + (rect.bottom - rect.top - height) / 2,
    )
}

unsafe extern "system" fn prompt_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
            if let Some(state) = prompt_state_mut(hwnd) {
                state.hwnd = hwnd;
                state.build_controls();
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            if let Some(state) = prompt_state_mut(hwnd) {
                state.handle_command(wparam);
            }
            LRESULT(0)
        }
        WM_ERASEBKGND => {
            if let Some(state) = prompt_state_mut(hwnd) {
                let mut rect = RECT::default();
                let _ = GetClientRect(hwnd, &mut rect);
                FillRect(HDC(wparam.0 as isize), &rect, state.brush);
                return LRESULT(1);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_CTLCOLORSTATIC | WM_CTLCOLOREDIT | WM_CTLCOLORBTN => match prompt_state_mut(hwnd) {
            Some(state) => state.color_control(HDC(wparam.0 as isize)),
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        },
        WM_CLOSE => {
            match prompt_state_mut(hwnd) {
                Some(state) => state.close(DialogResult::Cancelled),
                None => {
                    let _ = DestroyWindow(hwnd);
                }
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            if let Some(state) = prompt_state_mut(hwnd) {
                if state.result == DialogResult::Pending {
                    state.result = DialogResult::Cancelled;
                }
                state.hwnd = HWND(0);
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn run_modal_loop(state_ptr: *mut PromptState) {
    unsafe {
        let mut msg = MSG::default();
        while (*state_ptr).hwnd.0 != 0 && IsWindow((*state_ptr).hwnd).as_bool() {
            if PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    let _ = PostMessageW(HWND(0), WM_QUIT, msg.wParam, msg.lParam);
                    break;
                }

                if !IsDialogMessageW((*state_ptr).hwnd, &mut msg).as_bool() {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            } else {
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

unsafe fn prompt_state_mut(hwnd: HWND) -> Option<&'static mut PromptState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut PromptState;
    if ptr.is_null() { None } else { Some(&mut *ptr) }
}

fn create_control(
    parent: HWND,
    font: HFONT,
    class: PCWSTR,
    text: &str,
    style: WINDOW_STYLE,
    (x, y, width, height): (i32, i32, i32, i32),
    id: i32,
) -> HWND {
    let text = to_wstring(text);
    unsafe {
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class,
            PCWSTR(text.as_ptr()),
            style,
            x,
            y,
            width,
            height,
            parent,
            HMENU(id as isize),
            None,
            None,
        );
        SendMessageW(hwnd, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
        hwnd
    }
}

fn create_button(parent: HWND, font: HFONT, text: &str, x: i32, y: i32, id: i32, default: bool) -> HWND {
    let kind = if default { BS_DEFPUSHBUTTON } else { BS_PUSHBUTTON };
    let style = WS_CHILD.0 | WS_VISIBLE.0 | WS_TABSTOP.0 | (kind as u32);
    create_control(
        parent,
        font,
        w!("BUTTON"),
        text,
        WINDOW_STYLE(style),
        (x, y, BUTTON_WIDTH, BUTTON_HEIGHT),
        id,
    )
}

fn read_control_text(hwnd: HWND) -> String {
    unsafe {
        let length = GetWindowTextLengthW(hwnd);
        if length <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u16; length as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buffer);
        String::from_utf16_lossy(&buffer[..copied.max(0) as usize])
    }
}
