//! The four outbound message templates.
//!
//! Immutable institute texts, selected by conversation state. The contact
//! picks an option by replying with its number.

/// An outbound message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTemplate {
    /// Initial outreach sent to every new registration.
    Welcome,
    /// Option 1: course program details.
    CourseDetails,
    /// Option 2: pricing.
    Pricing,
    /// Option 3: confirmation acknowledged, a coordinator will call back.
    ConfirmationAck,
}

impl MessageTemplate {
    /// The literal message text.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Welcome => {
                "السلام عليكم ورحمة الله وبركاته\n\
                 أنا هاجر من مؤسسة الهناء لتعليم القرآن للنساء\n\n\
                 يسعدنا خدمتك، المرجو إخبارنا بطلبك من خلال اختيار أحد الخيارات التالية:\n\n\
                 1️⃣ الاستفسار عن تفاصيل الدورة\n\
                 2️⃣ معرفة تكلفة الدورة\n\
                 3️⃣ التواصل معك من طرف مسؤولة التأكيد\n\n\
                 المرجو إرسال رقم الخيار المناسب، وجزاكِ الله خيرًا."
            }
            Self::CourseDetails => {
                "بالنسبة للبرنامج للنساء حصة واحدة في الأسبوع على ساعة 19h30 الى 21h00\n\
                 برنامج شامل فيه كل شيء :\n\
                 *تفسير الآيات ( تدبر )\n\
                 *دروس الأحكام و قواعد التجويد ( نظرية و تطبيقية)\n\
                 *حصة خاصة للاستضهار"
            }
            Self::Pricing => "ثمن 350 كل 3 أشهر +50 درهم رسوم التسجيل",
            Self::ConfirmationAck => {
                "تم تسجيل طلبك، وستقوم مسؤولة التأكيد بالتواصل معك في أقرب وقت إن شاء الله.\n\n\
                 نرجو إبقاء هاتفك متاحًا، ونسعد بخدمتك دائمًا"
            }
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::CourseDetails => "course_details",
            Self::Pricing => "pricing",
            Self::ConfirmationAck => "confirmation_ack",
        }
    }
}
