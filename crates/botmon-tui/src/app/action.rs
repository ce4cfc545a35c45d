/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // UI toggles
    ToggleHelp,
    ToggleTimestamps,
    ToggleAttributes,

    // Viewport
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    JumpToLatest,

    // Server-side level filter
    CycleLevel,
    CycleLevelBack,

    // Text filter input
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ApplyFilter,
    ClearFilter,

    // Sync
    Reload,

    // Destructive clear (asks for confirmation first)
    RequestClear,
    ConfirmClear,
    CancelClear,

    // Error handling
    ShowError(String),
    DismissError,
}
