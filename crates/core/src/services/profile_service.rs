use std::collections::{BTreeMap, HashSet};

use crate::models::profile::{InvestorProfile, ProfileStats, ProfileTheme, ThemeCluster};
use crate::models::stock::{InvestStyle, RiskLevel, Stock};

/// Distinct sectors needed for an extravert ('E') reading.
const E_MIN_SECTORS: usize = 4;

/// Distinct industries up to which the learner reads as judging ('J').
const J_MAX_INDUSTRIES: usize = 3;

/// Type used for an empty selection and for unknown codes.
const FALLBACK_TYPE: &str = "ISTJ";

struct ProfileTemplate {
    code: &'static str,
    name: &'static str,
    description: &'static str,
    traits: [&'static str; 3],
    strategy: &'static str,
    icon: &'static str,
}

const PROFILES: [ProfileTemplate; 16] = [
    ProfileTemplate {
        code: "ISTJ",
        name: "谨慎观察者",
        description: "你偏好稳健、熟悉的公司，习惯先把风险看清楚再出手。",
        traits: ["稳健", "专注", "重视安全边际"],
        strategy: "以低估值蓝筹为核心仓位，分批买入并长期持有。",
        icon: "🛡️",
    },
    ProfileTemplate {
        code: "ISFJ",
        name: "守护型投资者",
        description: "你关注身边熟悉的品牌，愿意为确定性支付一点溢价。",
        traits: ["耐心", "忠诚", "重视口碑"],
        strategy: "围绕消费龙头构建组合，关注分红与现金流。",
        icon: "🏠",
    },
    ProfileTemplate {
        code: "INFJ",
        name: "远见理想家",
        description: "你相信长期趋势，会为认同的行业愿景集中下注。",
        traits: ["长期主义", "价值观驱动", "集中"],
        strategy: "选择少数长期赛道，逢回调加仓，忽略短期噪音。",
        icon: "🔭",
    },
    ProfileTemplate {
        code: "INTJ",
        name: "战略规划师",
        description: "你用框架拆解成长机会，在少数行业里深挖研究。",
        traits: ["理性", "深度研究", "成长导向"],
        strategy: "深入研究少数高成长行业，设定估值区间后执行纪律。",
        icon: "♟️",
    },
    ProfileTemplate {
        code: "ISTP",
        name: "冷静操盘手",
        description: "你对不同行业都保持好奇，但下单前一定会算清楚风险收益。",
        traits: ["务实", "灵活", "风险可控"],
        strategy: "在多个低风险行业间轮动，严格设置止损。",
        icon: "🔧",
    },
    ProfileTemplate {
        code: "ISFP",
        name: "灵感收藏家",
        description: "你凭感觉发现好公司，兴趣广泛但仓位克制。",
        traits: ["敏锐", "随性", "审美驱动"],
        strategy: "小仓位分散尝试，保留核心稳健资产作为底仓。",
        icon: "🎨",
    },
    ProfileTemplate {
        code: "INFP",
        name: "理想探索者",
        description: "你被有故事、有使命感的公司吸引，愿意陪伴它们成长。",
        traits: ["理想主义", "好奇", "包容波动"],
        strategy: "配置多个新兴行业的成长股，定期复盘基本面。",
        icon: "🌱",
    },
    ProfileTemplate {
        code: "INTP",
        name: "逻辑研究员",
        description: "你喜欢研究各种商业模式，用逻辑验证成长假设。",
        traits: ["分析", "跨行业", "独立思考"],
        strategy: "建立跨行业观察清单，用数据验证后再分批建仓。",
        icon: "🧪",
    },
    ProfileTemplate {
        code: "ESTP",
        name: "行动派交易者",
        description: "你视野开阔、反应迅速，喜欢在不同板块寻找机会。",
        traits: ["果断", "机会主义", "纪律"],
        strategy: "跨板块配置低风险标的，快速响应市场变化。",
        icon: "⚡",
    },
    ProfileTemplate {
        code: "ESFP",
        name: "热情体验家",
        description: "你热爱尝鲜，什么行业都想参与一下。",
        traits: ["热情", "多元", "乐于尝试"],
        strategy: "用指数基金打底，再用小额资金体验热门赛道。",
        icon: "🎉",
    },
    ProfileTemplate {
        code: "ENFP",
        name: "创意冒险家",
        description: "你对新趋势充满热情，乐于在多个成长赛道同时布局。",
        traits: ["乐观", "创新", "高容忍度"],
        strategy: "分散布局多个成长赛道，控制单一仓位上限。",
        icon: "🚀",
    },
    ProfileTemplate {
        code: "ENTP",
        name: "机会辩论家",
        description: "你擅长发现被忽视的机会，敢于逆向思考。",
        traits: ["好辩", "逆向", "广泛涉猎"],
        strategy: "在多个行业寻找预期差，用仓位管理对冲判断失误。",
        icon: "💡",
    },
    ProfileTemplate {
        code: "ESTJ",
        name: "稳健管理者",
        description: "你的组合覆盖面广，但每个选择都经过严格筛选。",
        traits: ["有条理", "重视规则", "分散"],
        strategy: "按行业均衡配置低估值龙头，定期再平衡。",
        icon: "📋",
    },
    ProfileTemplate {
        code: "ESFJ",
        name: "和谐配置师",
        description: "你追求组合的平衡与安心，兼顾多个熟悉的领域。",
        traits: ["均衡", "重视共识", "稳定"],
        strategy: "以消费和金融为底仓，辅以少量成长标的。",
        icon: "⚖️",
    },
    ProfileTemplate {
        code: "ENFJ",
        name: "趋势引领者",
        description: "你善于把握大方向，在多个成长板块里挑选领军者。",
        traits: ["感召力", "方向感", "成长导向"],
        strategy: "围绕产业趋势配置各板块龙头，长期跟踪。",
        icon: "🌟",
    },
    ProfileTemplate {
        code: "ENTJ",
        name: "果敢指挥官",
        description: "你目标明确，敢于在多个高成长领域重仓出击。",
        traits: ["果断", "进取", "高效"],
        strategy: "集中资金于确定性最高的成长龙头，严格执行计划。",
        icon: "👑",
    },
];

/// Classifies liked stocks into a four-letter investor type.
///
/// Pure business logic, no I/O. Each axis is computed independently over
/// the whole liked set.
pub struct ProfileService;

impl ProfileService {
    pub fn new() -> Self {
        Self
    }

    /// Build the profile for a set of liked stocks.
    ///
    /// An empty set yields the ISTJ fallback flagged with `is_fallback`.
    pub fn analyze(&self, liked: &[Stock]) -> InvestorProfile {
        if liked.is_empty() {
            let mut profile = build_profile(FALLBACK_TYPE, ProfileStats::default().zero_filled());
            profile.description =
                "你还没有选择任何股票，先去挑几只感兴趣的公司吧。".to_string();
            profile.is_fallback = true;
            return profile;
        }

        let code = self.type_code(liked);
        build_profile(&code, self.stats(liked))
    }

    /// Four-letter type code for a non-empty liked set.
    pub fn type_code(&self, liked: &[Stock]) -> String {
        let sectors: HashSet<&str> = liked.iter().map(|s| s.sector.as_str()).collect();
        let industries: HashSet<&str> = liked.iter().map(|s| s.industry.as_str()).collect();

        let growth = liked.iter().filter(|s| s.style() == InvestStyle::Growth).count();
        let value = liked.iter().filter(|s| s.style() == InvestStyle::Value).count();
        let high = liked.iter().filter(|s| s.risk() == RiskLevel::High).count();
        let low = liked.iter().filter(|s| s.risk() == RiskLevel::Low).count();

        let mut code = String::with_capacity(4);
        code.push(if sectors.len() >= E_MIN_SECTORS { 'E' } else { 'I' });
        code.push(if growth > value { 'N' } else { 'S' });
        code.push(if low > high { 'T' } else { 'F' });
        code.push(if industries.len() <= J_MAX_INDUSTRIES { 'J' } else { 'P' });
        code
    }

    /// Sector/style/risk counts; style and risk are zero-filled.
    pub fn stats(&self, liked: &[Stock]) -> ProfileStats {
        let mut stats = ProfileStats::default().zero_filled();
        for stock in liked {
            *stats.by_sector.entry(stock.sector.clone()).or_insert(0) += 1;
            *stats.by_style.entry(stock.style()).or_insert(0) += 1;
            *stats.by_risk.entry(stock.risk()).or_insert(0) += 1;
        }
        stats
    }

    /// Presentation cluster: NT / NF / SJ / SP.
    pub fn theme(&self, type_code: &str) -> ProfileTheme {
        theme_cluster(type_code).theme()
    }
}

impl Default for ProfileService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStats {
    fn zero_filled(mut self) -> Self {
        for style in InvestStyle::ALL {
            self.by_style.entry(style).or_insert(0);
        }
        for risk in RiskLevel::ALL {
            self.by_risk.entry(risk).or_insert(0);
        }
        self
    }
}

fn build_profile(code: &str, stats: ProfileStats) -> InvestorProfile {
    let template = PROFILES
        .iter()
        .find(|p| p.code == code)
        .or_else(|| PROFILES.iter().find(|p| p.code == FALLBACK_TYPE))
        .unwrap_or(&PROFILES[0]);

    InvestorProfile {
        type_code: template.code.to_string(),
        name: template.name.to_string(),
        description: template.description.to_string(),
        traits: template.traits.iter().map(|t| t.to_string()).collect(),
        strategy: template.strategy.to_string(),
        icon: template.icon.to_string(),
        stats,
        is_fallback: false,
    }
}

fn theme_cluster(type_code: &str) -> ThemeCluster {
    let letters: Vec<char> = type_code.chars().collect();
    let second = letters.get(1).copied().unwrap_or('S');
    if second == 'N' {
        if letters.get(2) == Some(&'T') {
            ThemeCluster::Analyst
        } else {
            ThemeCluster::Diplomat
        }
    } else if letters.get(3) == Some(&'J') {
        ThemeCluster::Sentinel
    } else {
        ThemeCluster::Explorer
    }
}

/// Look up the static profile for a type code. Unknown codes resolve to ISTJ.
pub fn profile_for_code(code: &str) -> InvestorProfile {
    build_profile(code, ProfileStats::default().zero_filled())
}

/// All sixteen type codes in table order.
pub fn all_type_codes() -> Vec<&'static str> {
    PROFILES.iter().map(|p| p.code).collect()
}
