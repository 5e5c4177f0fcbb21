//! User-facing strings, in the office's working language (Arabic).
//!
//! Log lines and error `Display` impls stay in English for operators; anything
//! printed at the console prompt comes from here so wording stays consistent
//! across the identity, registry, case desk, and advisory surfaces.

pub const LOGIN_FAILED: &str = "بيانات الدخول غير صحيحة.";
pub const LOGIN_NO_MATCH: &str = "لا يوجد سجل مطابق لهذه البيانات.";

pub const STORE_FAILED: &str = "تعذر حفظ البيانات، حاول مرة أخرى.";
pub const ACTION_NOT_ALLOWED: &str = "هذا الإجراء غير متاح لدورك الحالي.";
pub const ARCHIVE_ADMIN_ONLY: &str = "أرشفة القضايا صلاحية حصرية لمدير المكتب.";

pub const CASE_NOT_FOUND: &str = "القضية غير موجودة.";
pub const CLIENT_NOT_FOUND: &str = "الموكل غير موجود.";
pub const RECORD_NOT_FOUND: &str = "السجل غير موجود.";

pub const CLIENT_FIELDS_REQUIRED: &str = "الاسم ورقم الهوية ورقم الهاتف حقول مطلوبة.";
pub const CLIENT_DUPLICATE: &str = "يوجد موكل مسجل بنفس البريد الإلكتروني ورقم الهوية.";

pub const CASE_TITLE_REQUIRED: &str = "عنوان القضية مطلوب.";
pub const COMMENT_EMPTY: &str = "لا يمكن إضافة تعليق فارغ.";
pub const DOCUMENT_NAME_REQUIRED: &str = "اسم المستند مطلوب.";
pub const PAID_EXCEEDS_FEE: &str = "المبلغ المدفوع لا يمكن أن يتجاوز إجمالي الأتعاب.";
pub const AMOUNT_NOT_POSITIVE: &str = "المبلغ يجب أن يكون أكبر من صفر.";

pub const EXPORT_FAILED: &str = "تعذر تصدير الملف المطلوب.";

pub const DRAFT_FAILED: &str = "تعذر إعداد المستند المطلوب.";
pub const ADVISORY_UNAVAILABLE: &str =
    "عذراً، تعذر الحصول على رد من المستشار الذكي. حاول مرة أخرى لاحقاً.";
pub const ADVISORY_DISABLED: &str =
    "المستشار الذكي غير مفعّل. عيّن ADVISORY_API_KEY ثم أعد التشغيل.";
pub const ADVISORY_NO_IMAGE: &str = "لم يتم إنشاء صورة لهذا الطلب.";

pub const LOGIN_REQUIRED: &str = "يرجى تسجيل الدخول أولاً.";
pub const LOGGED_OUT: &str = "تم تسجيل الخروج.";
pub const SAVED: &str = "تم الحفظ.";
pub const CASE_ARCHIVED: &str = "نُقلت القضية إلى الأرشيف.";
pub const CASE_RESTORED: &str = "أعيدت القضية من الأرشيف.";
pub const NO_CITATION: &str = "لا يوجد مصدر بهذا الرقم.";
pub const UNKNOWN_COMMAND: &str = "أمر غير معروف. اكتب help لعرض الأوامر المتاحة.";
pub const EMPTY_LIST: &str = "لا توجد سجلات بعد.";
pub const LIBRARY_UNAVAILABLE: &str = "تعذر تحميل المكتبة القانونية.";
pub const SEARCH_NO_RESULTS: &str = "لا توجد نتائج مطابقة.";
pub const AMOUNT_INVALID: &str = "المبلغ المدخل غير صالح.";
pub const DATE_INVALID: &str = "التاريخ المدخل غير صالح، الصيغة المطلوبة: YYYY-MM-DD.";
pub const FILE_UNREADABLE: &str = "تعذر قراءة الملف المطلوب.";

pub fn welcome(display_name: &str) -> String {
    format!("مرحباً {display_name}")
}
