//! # Served Pages
//!
//! Static HTML for the web entry points. The markup is the tool's Korean
//! interface: a Bootstrap-styled upload form, an upload confirmation, and
//! a download page that triggers the file transfer on load.

/// Upload form served at `/`. The submit button stays disabled until the
/// file input has at least one selection.
pub const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
  <meta charset="UTF-8">
  <title>파일 업로드</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css">
</head>
<body class="bg-light">

<div class="container my-5">
  <h1 class="text-center mb-4">이미지 업로드</h1>

  <form id="uploadForm" action="/upload" method="POST" enctype="multipart/form-data">
    <div class="text-center mb-3">
      <input
        id="imageInput"
        type="file"
        name="image"
        multiple
        accept="image/*"
        class="form-control d-inline-block"
        style="width:80vw;"
      >
    </div>

    <div class="text-center">
      <button
        id="uploadButton"
        type="button"
        class="btn btn-primary"
        disabled
      >
        업로드 및 문서 생성
      </button>
    </div>
  </form>
</div>

<script>
const imageInput = document.getElementById("imageInput");
const uploadButton = document.getElementById("uploadButton");

imageInput.addEventListener("change", function () {
  uploadButton.disabled = imageInput.files.length === 0;
});

uploadButton.addEventListener("click", function () {
  document.getElementById("uploadForm").submit();
});
</script>

</body>
</html>
"#;

const RESULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
    <meta charset="utf-8">
    <title>문서 생성 완료</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css">
</head>
<body class="bg-light">

<div class="container my-5 text-center">
    <h2 class="mb-4">문서 생성 완료!</h2>
    <p>총 {num_images} 개의 이미지 업로드됨.</p>
    <form method="GET" action="/download" class="d-inline">
        <button type="submit" class="btn btn-success">다운로드</button>
    </form>
</div>

</body>
</html>
"#;

/// Download page served at `/download` when a generated document exists.
/// Navigates to `/download_file` on load so the transfer starts
/// immediately.
pub const DOWNLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
    <meta charset="utf-8">
    <title>다운로드 페이지</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css">
</head>
<body class="bg-light">

<div class="container my-5 text-center">
    <h2 class="mb-4">다운로드 페이지</h2>
    <p>파일 다운로드가 곧 시작됩니다...</p>
    <form action="/" method="GET" class="d-inline">
        <button type="submit" class="btn btn-secondary">뒤로가기</button>
    </form>
</div>

<script>
    window.location.href = "/download_file";
</script>
</body>
</html>
"#;

/// Fragment served (with status 200) when a download route is hit before
/// any document has been generated.
pub const NOT_FOUND_FRAGMENT: &str = "<h2>파일이 존재하지 않습니다.</h2>";

/// Confirmation page with the persisted image count substituted in.
pub fn result_page(count: usize) -> String {
    RESULT_TEMPLATE.replace("{num_images}", &count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_form_posts_multipart_to_upload() {
        assert!(UPLOAD_FORM.contains("action=\"/upload\""));
        assert!(UPLOAD_FORM.contains("method=\"POST\""));
        assert!(UPLOAD_FORM.contains("enctype=\"multipart/form-data\""));
        assert!(UPLOAD_FORM.contains("name=\"image\""));
        assert!(UPLOAD_FORM.contains("multiple"));
        assert!(UPLOAD_FORM.contains("업로드 및 문서 생성"));
    }

    #[test]
    fn result_page_substitutes_the_count() {
        let page = result_page(7);
        assert!(page.contains("총 7 개의 이미지 업로드됨."));
        assert!(!page.contains("{num_images}"));
        assert!(result_page(0).contains("총 0 개의 이미지 업로드됨."));
    }

    #[test]
    fn result_page_links_to_download() {
        let page = result_page(1);
        assert!(page.contains("action=\"/download\""));
        assert!(page.contains("다운로드"));
    }

    #[test]
    fn download_page_redirects_to_the_file_route() {
        assert!(DOWNLOAD_PAGE.contains("window.location.href = \"/download_file\""));
        assert!(DOWNLOAD_PAGE.contains("뒤로가기"));
    }

    #[test]
    fn every_page_is_korean_and_bootstrap_styled() {
        for page in [UPLOAD_FORM, RESULT_TEMPLATE, DOWNLOAD_PAGE] {
            assert!(page.contains("lang=\"ko\""));
            assert!(page.contains("bootstrap@5.3.0"));
        }
    }
}
