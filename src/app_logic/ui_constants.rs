/*
 * Labels the window chrome shows on its Undo action. The `&` marks the
 * keyboard accelerator.
 */

pub const UNDO_TEXT_CLOSED_TAB: &str = "Und&o: Closed Tab";

pub const UNDO_TEXT_CLOSED_WINDOW: &str = "Und&o: Closed Window";
