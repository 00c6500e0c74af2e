//! Extension-driven file classification: MIME type and display category.

/// Fallback MIME type for unrecognized extensions.
pub const GENERIC_MIME: &str = "*/*";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Infer a MIME type from an extension. Case-insensitive.
pub fn mime_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsb" => "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "tar" => "application/x-tar",
        "gzip" => "application/gzip",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => GENERIC_MIME,
    }
}

/// Whether the extension names an image format with inline thumbnails.
pub fn is_image(extension: &str) -> bool {
    let ext = extension.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Icon shown for folders.
pub const FOLDER_ICON: &str = "folder-outline";

/// Accent color for folders.
pub const FOLDER_COLOR: &str = "#F39C12";

/// Display category of a file, used to pick icons and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
    Text,
    Delimited,
    Archive,
    Audio,
    Video,
    Unknown,
}

impl FileCategory {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => FileCategory::Image,
            "pdf" => FileCategory::Pdf,
            "doc" | "docx" => FileCategory::Word,
            "xls" | "xlsx" => FileCategory::Spreadsheet,
            "ppt" | "pptx" => FileCategory::Presentation,
            "txt" => FileCategory::Text,
            "csv" => FileCategory::Delimited,
            "zip" | "rar" | "tar" | "gzip" => FileCategory::Archive,
            "mp3" | "wav" => FileCategory::Audio,
            "mp4" | "mov" | "avi" => FileCategory::Video,
            _ => FileCategory::Unknown,
        }
    }

    /// Material icon name for the category.
    pub fn icon(&self) -> &'static str {
        match self {
            FileCategory::Image => "file-image-outline",
            FileCategory::Pdf => "file-pdf-box",
            FileCategory::Word => "file-word-outline",
            FileCategory::Spreadsheet => "file-excel-outline",
            FileCategory::Presentation => "file-powerpoint-outline",
            FileCategory::Text => "file-document-outline",
            FileCategory::Delimited => "file-delimited-outline",
            FileCategory::Archive => "zip-box-outline",
            FileCategory::Audio => "file-music-outline",
            FileCategory::Video => "file-video-outline",
            FileCategory::Unknown => "file-outline",
        }
    }

    /// Accent color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            FileCategory::Image => "#E91E63",
            FileCategory::Pdf => "#D32F2F",
            FileCategory::Word => "#2196F3",
            FileCategory::Spreadsheet => "#4CAF50",
            FileCategory::Presentation => "#FF9800",
            FileCategory::Text => "#607D8B",
            FileCategory::Delimited => "#009688",
            FileCategory::Archive => "#795548",
            FileCategory::Audio => "#9C27B0",
            FileCategory::Video => "#673AB7",
            FileCategory::Unknown => "#8A8A8E",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Pdf => "pdf",
            FileCategory::Word => "document",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Presentation => "presentation",
            FileCategory::Text => "text",
            FileCategory::Delimited => "csv",
            FileCategory::Archive => "archive",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Unknown => "unknown",
        }
    }
}
