//! Canned response texts (Vietnamese) and document links.

pub const HELP_TEXT: &str = "📚 **DANH SÁCH LỆNH**\n\n\
**Cơ bản:**\n\
• /help - Hiển thị trợ giúp\n  Ví dụ: /help\n\n\
• /info - Thông tin bot\n  Ví dụ: /info\n\n\
• /menu - Menu lệnh\n  Ví dụ: /menu\n\n\
**Đăng ký:**\n\
• /register - Đăng ký nhận thông báo\n  Ví dụ: /register\n\n\
• /unregister - Hủy đăng ký\n  Ví dụ: /unregister\n\n\
• /notify [on|off] - Bật/Tắt thông báo\n  Ví dụ: /notify on hoặc /notify off\n\n\
**Lịch học:**\n\
• /today - Xem lịch hôm nay\n  Ví dụ: /today\n\n\
• /class [Mã môn] - Chi tiết lớp học\n  Ví dụ: /class MA004\n  Hoặc: /class (xem tất cả)\n\n\
**Bài tập:**\n\
• /assignments - Danh sách bài tập\n  Ví dụ: /assignments\n\n\
• /add_assignment_class {JSON} - Thêm bài tập cho cả lớp\n  \
Ví dụ: /add_assignment_class {\"name\": \"Bài tập 1\", \"classSubjectId\": \"IT003\", \"deadline\": \"2026-01-15 23:59\"}\n\n\
• /status_assignment Mã|true/false - Cập nhật trạng thái\n  Ví dụ: /status_assignment abc123|true\n\n\
• /remove_assignment Mã bài tập - Xóa bài tập\n  Ví dụ: /remove_assignment abc123\n\n\
**Tài liệu:**\n\
• /docs [Mã môn] - Truy cập tài liệu\n  Ví dụ: /docs MA004\n\n\
💡 Gửi /menu để xem menu tương tác";

pub const MENU_TEXT: &str =
    "📋 **MENU LỆNH**\n\nChọn một lệnh bên dưới hoặc gửi /help để xem hướng dẫn chi tiết.";

pub const MENU_BUTTONS: &[(&str, &str)] = &[
    ("📅 Lịch học", "/today"),
    ("📝 Bài tập", "/assignments"),
    ("📚 Tài liệu", "/docs"),
    ("⚙️ Cài đặt", "/notify"),
];

pub fn menu_message() -> String {
    let buttons: Vec<String> = MENU_BUTTONS
        .iter()
        .map(|(text, command)| format!("{text} - {command}"))
        .collect();
    format!("{MENU_TEXT}\n{}", buttons.join("\n"))
}

pub const INFO_TEXT: &str = "ℹ️ **STUDY OPTIMIZER BOT**\n\n\
🎯 **Mục đích:** Hỗ trợ quản lý lịch học và bài tập\n\n\
✨ **Tính năng:**\n\
• Thông báo lịch học hàng ngày\n\
• Quản lý bài tập\n\
• Truy cập tài liệu học tập\n\
• Theo dõi tiến độ học tập\n\n\
📧 Hỗ trợ: Liên hệ admin nếu cần trợ giúp\n\
🔖 Phiên bản thử nghiệm: 1.0.0";

pub const REGISTER_SUCCESS: &str = "✅ **ĐĂNG KÝ THÀNH CÔNG!**\n\n\
Bạn đã đăng ký nhận thông báo lịch học từ Study Optimizer.\n\n\
📅 Bạn sẽ nhận thông báo:\n\
• Mỗi sáng trước khi bắt đầu ngày học\n\
• Nhắc nhở về bài tập sắp đến hạn\n\
• Cập nhật lịch học khi có thay đổi\n\n\
💡 Gửi /notify off để tạm tắt thông báo.";

pub fn register_success_message() -> String {
    format!(
        "{REGISTER_SUCCESS}\n\n🎊 Bạn đã được đăng ký vào các lớp học. \
Sử dụng lệnh /class để xem chi tiết lớp học của bạn. \
Hoặc có thể liên hệ với admin để thay đổi lớp học nhé!"
    )
}

pub const REGISTER_ALREADY: &str = "ℹ️ Bạn đã đăng ký trước đó rồi.\n\n\
Bạn đang nhận thông báo lịch học hàng ngày.\n\
Gửi /unregister nếu muốn hủy đăng ký.";

pub const UNREGISTER_SUCCESS: &str = "✅ **HỦY ĐĂNG KÝ THÀNH CÔNG**\n\n\
Bạn đã hủy đăng ký khỏi Study Optimizer.\n\n\
❌ Bạn sẽ không còn nhận:\n\
• Thông báo lịch học hàng ngày\n\
• Nhắc nhở về bài tập\n\n\
💡 Gửi /register bất cứ lúc nào để đăng ký lại.";

/// Also the precondition message for commands that need registration.
pub const NOT_REGISTERED: &str = "ℹ️ Bạn chưa đăng ký nhận thông báo.\n\n\
Gửi /register để bắt đầu nhận thông báo lịch học.";

pub const NO_CLASSES: &str = "Bạn chưa đăng ký lớp học nào. Vui lòng sử dụng lệnh /register \
để đăng ký lớp học hoặc liên hệ với admin để biết thêm chi tiết. 😊";

pub const NO_CLASSES_TODAY: &str =
    "Hôm nay bạn không có lịch học nào. Chúc bạn một ngày vui vẻ! 🎉";

pub const NO_ASSIGNMENTS: &str = "Bạn chưa có bài tập nào.";

pub const NOTIFY_INVALID: &str =
    "Cú pháp bật/tắt thông báo không đúng. Vui lòng sử dụng: /notify on hoặc /notify off";

pub const ADD_ASSIGNMENT_SYNTAX: &str = "Cú pháp thêm bài tập không đúng. Vui lòng sử dụng: \
/add_assignment_class {\"name\": \"Tên bài tập\", \"classSubjectId\": \"Mã lớp\", \
\"deadline\": \"YYYY-MM-DD HH:MM\"}";

pub const ADD_ASSIGNMENT_BAD_DATE: &str =
    "Định dạng ngày tháng không đúng. Vui lòng sử dụng định dạng: YYYY-MM-DD HH:MM";

pub const REMOVE_ASSIGNMENT_SYNTAX: &str =
    "Cú pháp xóa bài tập không đúng. Vui lòng sử dụng: /remove_assignment Mã Bài Tập";

pub const STATUS_ASSIGNMENT_SYNTAX: &str = "Cú pháp cập nhật trạng thái bài tập không đúng. \
Vui lòng sử dụng: /status_assignment Mã Bài Tập|completed(true/false)";

pub const PERMISSION_DENIED: &str = "Bạn không có quyền sử dụng lệnh này.";

pub const DOCS_NOT_FOUND: &str = "❌ Không tìm thấy tài liệu cho mã môn này.\n\n\
💡 Gửi /class để xem danh sách môn học";

pub const GENERAL_ERROR: &str =
    "❌ Đã xảy ra lỗi. Vui lòng thử lại sau.\n\n💡 Gửi /help nếu cần trợ giúp.";

pub fn unknown_response(name: &str) -> String {
    format!(
        "Chào bạn {name}, hiện tại tôi chỉ xử lý được tin nhắn theo cú pháp đã định nghĩa. \
Vui lòng thử lại /help để biết thêm chi tiết ạ! 😊"
    )
}

pub fn photo_ack(name: &str) -> String {
    format!("Chào bạn {name}, bạn vừa gửi một bức ảnh dễ thương! 😊")
}

pub const STICKER_ACKS: &[&str] = &[
    "😘 Sticker dễ thương quá!",
    "😘 Cảm ơn bạn đã gửi sticker!",
    "😘 Sticker này thật vui nhộn!",
    "😘 Mình rất thích sticker bạn gửi!",
    "😘 Sticker siêu dễ thương luôn!",
    "😘 Cảm ơn bạn đã làm cho ngày của mình thêm vui với sticker này!",
    "😘 Sticker này thật sự rất đặc biệt!",
    "😘 Mình không thể ngừng cười với sticker bạn gửi!",
    "😘 Sticker này làm mình nhớ đến một kỷ niệm vui!",
    "😘 Bạn có thể gửi thêm sticker nữa không? Mình rất thích chúng!",
    "😘 Sticker này thật sự làm mình cảm thấy tuyệt vời!",
    "😘 Cảm ơn bạn đã chia sẻ sticker này với mình!",
];

/// Course-code to document-folder map. Prefix match on the code.
const DOC_LINKS: &[(&str, &str)] = &[
    (
        "IT003",
        "https://drive.google.com/drive/folders/1yq-UCLLKQ7sCprpgBAr0fyvTyHhAENzz",
    ),
    (
        "MA004",
        "https://drive.google.com/drive/folders/1ko2CZQ5Cim3bVmvxTaMp2ppQelyXYz7k?usp=sharing",
    ),
    (
        "IE105",
        "https://drive.google.com/drive/folders/19WuX5aageEQ_H_bEZaFIJI3fafV6F101?usp=sharing",
    ),
    (
        "MA005",
        "https://drive.google.com/drive/folders/1i3usHbgApzG3iT0Nzi8vV0mmfx_sFNU9?usp=sharing",
    ),
];

pub fn docs_link(code: &str) -> Option<&'static str> {
    let code = code.to_uppercase();
    DOC_LINKS
        .iter()
        .find(|(prefix, _)| code.starts_with(prefix))
        .map(|(_, link)| *link)
}

pub fn docs_listing() -> String {
    let lines: Vec<String> = DOC_LINKS
        .iter()
        .map(|(code, link)| format!("- {code}: {link}"))
        .collect();
    format!("📚 Danh sách tài liệu lớp học:\n{}", lines.join("\n"))
}
