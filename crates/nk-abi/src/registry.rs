// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native type to Odin type registry.
//!
//! Every composite type whose memory is shared between Nuklear and the Odin
//! binding has exactly one entry here. The table is maintained by hand: when
//! Nuklear's public structs change, this list must change with them
//! (`nk-abi-gen lint --header nuklear.h` reports the difference).
//!
//! Anonymous or nested unions get their own entry under a canonical name so
//! that a size mismatch always points at a single type.

use crate::error::{LayoutError, Result};
use std::borrow::Cow;
use std::fmt;

/// How a native type is spelled in C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Struct,
    Union,
    /// A typedef name, usually for an anonymous struct or union.
    Typedef,
}

/// A native composite type, as the C compiler names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeType {
    pub kind: NativeKind,
    pub name: &'static str,
}

impl NativeType {
    pub const fn struct_named(name: &'static str) -> Self {
        Self {
            kind: NativeKind::Struct,
            name,
        }
    }

    pub const fn union_named(name: &'static str) -> Self {
        Self {
            kind: NativeKind::Union,
            name,
        }
    }

    pub const fn typedef_named(name: &'static str) -> Self {
        Self {
            kind: NativeKind::Typedef,
            name,
        }
    }

    /// C spelling usable as a `sizeof` operand, e.g. `struct nk_rect`.
    pub fn spelling(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NativeKind::Struct => write!(f, "struct {}", self.name),
            NativeKind::Union => write!(f, "union {}", self.name),
            NativeKind::Typedef => f.write_str(self.name),
        }
    }
}

/// One registry entry: a native type and the Odin name that mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeBinding {
    pub native: NativeType,
    pub foreign: &'static str,
}

impl TypeBinding {
    pub const fn new(native: NativeType, foreign: &'static str) -> Self {
        Self { native, foreign }
    }
}

impl fmt::Display for TypeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.native, self.foreign)
    }
}

/// `bind!(struct nk_rect => "Rect")`, `bind!(union ..)`, `bind!(nk_handle => ..)`
macro_rules! bind {
    (struct $name:ident => $foreign:literal) => {
        TypeBinding::new(NativeType::struct_named(stringify!($name)), $foreign)
    };
    (union $name:ident => $foreign:literal) => {
        TypeBinding::new(NativeType::union_named(stringify!($name)), $foreign)
    };
    ($name:ident => $foreign:literal) => {
        TypeBinding::new(NativeType::typedef_named(stringify!($name)), $foreign)
    };
}

/// Every Nuklear composite type mirrored by the Odin binding, in emission order.
///
/// `union nk_style_item_data` appears twice; the second assertion is redundant
/// and the lint reports it, but it is kept so the output matches what the
/// binding has always been checked against.
pub static NUKLEAR_BINDINGS: &[TypeBinding] = &[
    // geometry, handles, images
    bind!(struct nk_rect => "Rect"),
    bind!(struct nk_recti => "RectI"),
    bind!(nk_handle => "Handle"),
    bind!(struct nk_image => "Image"),
    bind!(struct nk_nine_slice => "Nine_Slice"),
    bind!(struct nk_cursor => "Cursor"),
    bind!(struct nk_scroll => "Scroll"),
    // memory
    bind!(struct nk_allocator => "Allocator"),
    bind!(struct nk_list_view => "List_View"),
    bind!(struct nk_user_font => "User_Font"),
    bind!(struct nk_memory_status => "Memory_Status"),
    bind!(struct nk_buffer_marker => "Buffer_Marker"),
    bind!(struct nk_memory => "Memory"),
    bind!(struct nk_buffer => "Buffer"),
    bind!(struct nk_str => "Str"),
    // text editing
    bind!(struct nk_clipboard => "Clipboard"),
    bind!(struct nk_text_undo_record => "Text_Undo_Record"),
    bind!(struct nk_text_undo_state => "Text_Undo_State"),
    bind!(struct nk_text_edit => "Text_Edit"),
    // command buffer
    bind!(struct nk_command => "Command"),
    bind!(struct nk_command_scissor => "Command_Scissor"),
    bind!(struct nk_command_line => "Command_Line"),
    bind!(struct nk_command_curve => "Command_Curve"),
    bind!(struct nk_command_rect => "Command_Rect"),
    bind!(struct nk_command_rect_filled => "Command_Rect_Filled"),
    bind!(struct nk_command_rect_multi_color => "Command_Rect_Multi_Color"),
    bind!(struct nk_command_triangle => "Command_Triangle"),
    bind!(struct nk_command_triangle_filled => "Command_Triangle_Filled"),
    bind!(struct nk_command_circle => "Command_Circle"),
    bind!(struct nk_command_circle_filled => "Command_Circle_Filled"),
    bind!(struct nk_command_arc => "Command_Arc"),
    bind!(struct nk_command_arc_filled => "Command_Arc_Filled"),
    bind!(struct nk_command_polygon => "Command_Polygon"),
    bind!(struct nk_command_polygon_filled => "Command_Polygon_Filled"),
    bind!(struct nk_command_polyline => "Command_Polyline"),
    bind!(struct nk_command_image => "Command_Image"),
    bind!(struct nk_command_custom => "Command_Custom"),
    bind!(struct nk_command_text => "Command_Text"),
    bind!(struct nk_command_buffer => "Command_Buffer"),
    // input
    bind!(struct nk_mouse_button => "Mouse_Button"),
    bind!(struct nk_mouse => "Mouse"),
    bind!(struct nk_key => "Key"),
    bind!(struct nk_keyboard => "Keyboard"),
    bind!(struct nk_input => "Input"),
    // style
    bind!(union nk_style_item_data => "Style_Item_Data"),
    bind!(struct nk_style_item => "Style_Item"),
    bind!(struct nk_style_text => "Style_Text"),
    bind!(struct nk_style_button => "Style_Button"),
    bind!(struct nk_style_toggle => "Style_Toggle"),
    bind!(struct nk_style_selectable => "Style_Selectable"),
    bind!(struct nk_style_slider => "Style_Slider"),
    bind!(struct nk_style_progress => "Style_Progress"),
    bind!(struct nk_style_scrollbar => "Style_Scrollbar"),
    bind!(struct nk_style_edit => "Style_Edit"),
    bind!(struct nk_style_property => "Style_Property"),
    bind!(struct nk_style_chart => "Style_Chart"),
    bind!(struct nk_style_combo => "Style_Combo"),
    bind!(struct nk_style_tab => "Style_Tab"),
    bind!(struct nk_style_window => "Style_Window"),
    bind!(struct nk_style => "Style"),
    // layout, windows, context
    bind!(struct nk_chart_slot => "Chart_Slot"),
    bind!(struct nk_chart => "Chart"),
    bind!(struct nk_row_layout => "Row_Layout"),
    bind!(struct nk_popup_buffer => "Popup_Buffer"),
    bind!(struct nk_menu_state => "Menu_State"),
    bind!(struct nk_panel => "Panel"),
    bind!(struct nk_popup_state => "Popup_State"),
    bind!(struct nk_edit_state => "Edit_State"),
    bind!(struct nk_property_state => "Property_State"),
    bind!(struct nk_window => "Window"),
    bind!(struct nk_configuration_stacks => "Configuration_Stacks"),
    bind!(struct nk_table => "Table"),
    bind!(union nk_page_data => "Page_Data"),
    bind!(union nk_style_item_data => "Style_Item_Data"),
    bind!(struct nk_page_element => "Page_Element"),
    bind!(struct nk_page => "Page"),
    bind!(struct nk_pool => "Pool"),
    bind!(struct nk_context => "Context"),
    // configuration stack frames
    bind!(struct nk_config_stack_style_item => "Config_Stack_Style_Item"),
    bind!(struct nk_config_stack_float => "Config_Stack_Float"),
    bind!(struct nk_config_stack_vec2 => "Config_Stack_Vec2"),
    bind!(struct nk_config_stack_flags => "Config_Stack_Flags"),
    bind!(struct nk_config_stack_color => "Config_Stack_Color"),
    bind!(struct nk_config_stack_user_font => "Config_Stack_User_Font"),
    bind!(struct nk_config_stack_button_behavior => "Config_Stack_Button_Behavior"),
];

/// Ordered, immutable list of type bindings.
#[derive(Debug, Clone)]
pub struct Registry {
    bindings: Cow<'static, [TypeBinding]>,
}

impl Registry {
    pub fn new(bindings: Vec<TypeBinding>) -> Self {
        Self {
            bindings: Cow::Owned(bindings),
        }
    }

    pub const fn from_static(bindings: &'static [TypeBinding]) -> Self {
        Self {
            bindings: Cow::Borrowed(bindings),
        }
    }

    /// The built-in Nuklear registry.
    pub fn nuklear() -> Self {
        Self::from_static(NUKLEAR_BINDINGS)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeBinding> {
        self.bindings.iter()
    }

    pub fn as_slice(&self) -> &[TypeBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Foreign name bound to `native` (the first one, if registered twice).
    pub fn lookup(&self, native: &NativeType) -> Result<&'static str> {
        self.bindings
            .iter()
            .find(|b| b.native == *native)
            .map(|b| b.foreign)
            .ok_or_else(|| LayoutError::NotRegistered {
                native: native.spelling(),
            })
    }

    /// Same as [`Registry::lookup`], keyed by C spelling (`"struct nk_rect"`).
    pub fn lookup_spelling(&self, spelling: &str) -> Result<&'static str> {
        let wanted = normalize_spelling(spelling);
        self.bindings
            .iter()
            .find(|b| b.native.spelling() == wanted)
            .map(|b| b.foreign)
            .ok_or(LayoutError::NotRegistered { native: wanted })
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a TypeBinding;
    type IntoIter = std::slice::Iter<'a, TypeBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collapse runs of whitespace so `"struct  nk_rect "` matches `struct nk_rect`.
pub(crate) fn normalize_spelling(spelling: &str) -> String {
    spelling.split_whitespace().collect::<Vec<_>>().join(" ")
}
