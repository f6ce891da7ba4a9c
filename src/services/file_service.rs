//! 上传文件管理
//!
//! 文件内容写入 `<upload_dir>/<user_id>/<uuid><.ext>`，元数据写入 user_files 表。

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};
use uuid::Uuid;

use super::prompt_service::parse_id;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{NewUserFile, UserFile};

/// 允许保留的扩展名
static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,16}$").unwrap());

/// 提取安全的扩展名（含点号），不合法时返回空串
pub fn safe_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| EXTENSION_RE.is_match(ext))
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// 根据扩展名猜测 MIME 类型
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let ext = safe_extension(file_name);
    match ext.trim_start_matches('.') {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        "flac" => "audio/flac",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// 转写接口接受的音频（含 mp4/webm 容器）
pub fn is_audio_mime(mime_type: &str) -> bool {
    mime_type.starts_with("audio/") || mime_type == "video/mp4" || mime_type == "video/webm"
}

/// 按磁盘文件名判断类型，不采信上传时客户端声明的 Content-Type
pub fn detected_mime_type(file: &UserFile) -> &'static str {
    guess_mime_type(&file.filename)
}

/// 记录中路径的固定前缀
const RECORD_PATH_PREFIX: &str = "uploads";

/// 磁盘存储
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

/// 已写入磁盘的文件
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub filename: String,
    /// 记录到数据库的路径：`uploads/<user_id>/<filename>`
    pub relative_path: String,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 确保用户目录存在
    async fn ensure_user_dir(&self, user_id: &str) -> std::io::Result<PathBuf> {
        let user_dir = self.root.join(user_id);
        fs::create_dir_all(&user_dir).await?;
        Ok(user_dir)
    }

    /// 以新的唯一文件名写入
    pub async fn save(&self, user_id: &str, original_name: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        let user_dir = self.ensure_user_dir(user_id).await?;
        let filename = format!("{}{}", Uuid::new_v4(), safe_extension(original_name));
        fs::write(user_dir.join(&filename), bytes).await?;

        let relative_path = format!("{}/{}/{}", RECORD_PATH_PREFIX, user_id, filename);
        Ok(StoredFile {
            filename,
            relative_path,
        })
    }

    /// 读取文件内容；路径由 user_id 与 filename 重新拼接，不信任记录中的 path
    pub async fn read(&self, file: &UserFile) -> std::io::Result<Vec<u8>> {
        let is_separator = |c: char| c == '/' || c == '\\';
        if file.filename.contains(is_separator) || file.user_id.contains(|c: char| is_separator(c) || c == '.') {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file record contains an invalid path component",
            ));
        }
        fs::read(self.root.join(&file.user_id).join(&file.filename)).await
    }

    /// 删除磁盘文件（写库失败时回滚）
    async fn remove(&self, user_id: &str, filename: &str) {
        if let Err(e) = fs::remove_file(self.root.join(user_id).join(filename)).await {
            error!("Failed to remove orphaned upload {}: {}", filename, e);
        }
    }
}

/// 待保存的上传
#[derive(Debug)]
pub struct Upload {
    pub original_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 文件管理服务
#[derive(Clone)]
pub struct FileManagerService {
    db: Database,
    storage: FileStorage,
}

impl FileManagerService {
    pub fn new(db: Database, storage: FileStorage) -> Self {
        Self { db, storage }
    }

    pub async fn save_file(&self, upload: Upload, user_id: &str) -> AppResult<UserFile> {
        let stored = self
            .storage
            .save(user_id, &upload.original_name, &upload.bytes)
            .await
            .map_err(AppError::storage("Error uploading file"))?;

        let mime_type = upload
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| guess_mime_type(&upload.original_name).to_string());

        let record = NewUserFile {
            user_id: user_id.to_string(),
            filename: stored.filename.clone(),
            original_name: upload.original_name,
            mime_type,
            size: upload.bytes.len() as i64,
            path: stored.relative_path,
        };

        match self.db.create_user_file(record).await {
            Ok(file) => {
                info!("File uploaded: id={}, size={}", file.id, file.size);
                Ok(file)
            }
            Err(e) => {
                self.storage.remove(user_id, &stored.filename).await;
                Err(AppError::db("Error uploading file")(e))
            }
        }
    }

    pub async fn get_user_files(&self, user_id: &str) -> AppResult<Vec<UserFile>> {
        self.db
            .list_user_files(user_id)
            .await
            .map_err(AppError::db("Error fetching user files"))
    }

    /// 不存在时返回 None
    pub async fn get_file_by_id(&self, id: &str) -> AppResult<Option<UserFile>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        self.db
            .find_user_file(id)
            .await
            .map_err(AppError::db("Error fetching file"))
    }

    /// 读取记录及内容，不存在时返回 NotFound
    pub async fn read_file(&self, id: &str) -> AppResult<(UserFile, Vec<u8>)> {
        let file = self
            .get_file_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        let bytes = self
            .storage
            .read(&file)
            .await
            .map_err(AppError::storage("Error reading file"))?;
        Ok((file, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("photo.PNG"), ".png");
        assert_eq!(safe_extension("archive.tar.gz"), ".gz");
        assert_eq!(safe_extension("README"), "");
        assert_eq!(safe_extension("weird.p$p"), "");
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.jpg"), "image/jpeg");
        assert_eq!(guess_mime_type("voice.mp3"), "audio/mpeg");
        assert_eq!(guess_mime_type("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("uploads"));

        let stored = storage.save("0", "notes.txt", b"hello").await.unwrap();
        assert!(stored.filename.ends_with(".txt"));
        assert_eq!(stored.relative_path, format!("uploads/0/{}", stored.filename));
        assert!(dir.path().join("uploads").join("0").join(&stored.filename).exists());

        let record = UserFile {
            id: Uuid::new_v4(),
            user_id: "0".to_string(),
            filename: stored.filename.clone(),
            original_name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 5,
            path: stored.relative_path.clone(),
            created_at: Utc::now(),
        };
        assert_eq!(storage.read(&record).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_record_path_is_independent_of_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("var").join("lib").join("chat"));

        let stored = storage.save("0", "cat.png", b"png").await.unwrap();
        assert!(stored.relative_path.starts_with("uploads/0/"));
        assert!(!stored.relative_path.contains('\\'));
    }

    fn record(filename: &str, mime_type: &str) -> UserFile {
        UserFile {
            id: Uuid::new_v4(),
            user_id: "0".to_string(),
            filename: filename.to_string(),
            original_name: filename.to_string(),
            mime_type: mime_type.to_string(),
            size: 0,
            path: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_type_comes_from_extension() {
        let png = record("a1.png", "application/octet-stream");
        assert_eq!(detected_mime_type(&png), "image/png");
        assert!(is_image_mime(detected_mime_type(&png)));

        let disguised = record("a2.txt", "image/png");
        assert_eq!(detected_mime_type(&disguised), "text/plain");
        assert!(!is_image_mime(detected_mime_type(&disguised)));

        let voice = record("a3.mp3", "application/octet-stream");
        assert!(is_audio_mime(detected_mime_type(&voice)));
        assert!(is_audio_mime(detected_mime_type(&record("a4.webm", ""))));
        assert!(!is_audio_mime(detected_mime_type(&record("a5.png", "audio/mpeg"))));
    }

    #[tokio::test]
    async fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let a = storage.save("0", "same.png", b"a").await.unwrap();
        let b = storage.save("0", "same.png", b"b").await.unwrap();
        assert_ne!(a.filename, b.filename);
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let record = UserFile {
            id: Uuid::new_v4(),
            user_id: "..".to_string(),
            filename: "secret".to_string(),
            original_name: "secret".to_string(),
            mime_type: "text/plain".to_string(),
            size: 0,
            path: String::new(),
            created_at: Utc::now(),
        };
        let err = storage.read(&record).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
