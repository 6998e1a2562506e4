use crate::models::Scale;

/// 量表目录大小
pub const CATALOG_SIZE: usize = 14;

/// 静态量表目录
///
/// FEATS评估工具的全部14项量表，按固定顺序排列。既作为前端的
/// 种子数据，也作为依赖故障时降级响应的默认载荷。`rating` 与
/// `explanation` 是示例默认值，真实分析中由推理服务逐次生成。
pub fn default_scales() -> Vec<Scale> {
    vec![
        Scale {
            title: "Prominence of Color".to_string(),
            description: "Evaluates how color is used throughout the artwork, including intensity and variety.".to_string(),
            rating: 4,
            explanation: "The image prominently features vibrant colors—green for the tree canopy, red for the apples, and brown for the trunk. The colors are bold and consistently applied, with clear separation between elements. The simplicity and intensity of the colors create a strong visual impact, although the palette is limited to a few hues.".to_string(),
            image_url: "/images/scales/color.svg".to_string(),
        },
        Scale {
            title: "Color Fit".to_string(),
            description: "Assesses how appropriate and meaningful the color choices are to the subject matter.".to_string(),
            rating: 5,
            explanation: "The colors used are highly appropriate and harmonious with the scene depicted. Brown for the trunk, green for foliage, and red for apples align with natural expectations. The ladder in black and the small yellow section of the person climbing the tree do not clash, ensuring a balanced composition.".to_string(),
            image_url: "/images/scales/color-fit.svg".to_string(),
        },
        Scale {
            title: "Implied Energy".to_string(),
            description: "Assesses the level of energy and vitality expressed in the artwork.".to_string(),
            rating: 3,
            explanation: "While the person climbing the ladder suggests some dynamic action, the rest of the scene feels relatively static. The straight ladder and structured tree trunk contribute to a sense of stability, with minimal energetic or rapid movement implied in the lines.".to_string(),
            image_url: "/images/scales/energy.svg".to_string(),
        },
        Scale {
            title: "Space".to_string(),
            description: "Measures how space is utilized in the composition and the relationships between elements.".to_string(),
            rating: 3,
            explanation: "About half of the page is utilized, focusing mostly on the central area. While the elements (tree, person, and ladder) are well placed, the composition leaves significant unused white space, particularly to the right.".to_string(),
            image_url: "/images/scales/space.svg".to_string(),
        },
        Scale {
            title: "Integration".to_string(),
            description: "Evaluates how well the various elements work together as a cohesive whole.".to_string(),
            rating: 4,
            explanation: "The elements are integrated well—the tree, ladder, and person relate to one another logically. However, the background is entirely absent, which slightly reduces the overall cohesion of the scene.".to_string(),
            image_url: "/images/scales/integration.svg".to_string(),
        },
        Scale {
            title: "Logic".to_string(),
            description: "Evaluates the logical consistency and organization of the artwork.".to_string(),
            rating: 5,
            explanation: "The arrangement of elements is logical and consistent with the theme of picking apples. The tree is appropriately large and fruit-bearing, and the ladder and person's position are plausible for someone trying to reach the apples.".to_string(),
            image_url: "/images/scales/logic.svg".to_string(),
        },
        Scale {
            title: "Realism".to_string(),
            description: "Assesses how realistically objects and scenes are portrayed.".to_string(),
            rating: 4,
            explanation: "The scene is realistic in its proportions and placement of objects. The tree and apples are identifiable, and the ladder is appropriately scaled. The simplistic, cartoon-like style slightly reduces its overall realism.".to_string(),
            image_url: "/images/scales/realism.svg".to_string(),
        },
        Scale {
            title: "Problem-Solving".to_string(),
            description: "Evaluates the creative solutions used to represent challenging subjects.".to_string(),
            rating: 5,
            explanation: "The problem of reaching apples from a tall tree is effectively solved with the inclusion of a ladder and a person actively climbing. The artist demonstrates clear intent and execution to depict this scenario.".to_string(),
            image_url: "/images/scales/problem-solving.svg".to_string(),
        },
        Scale {
            title: "Developmental Level".to_string(),
            description: "Considers the artistic developmental stage reflected in the work.".to_string(),
            rating: 3,
            explanation: "The drawing shows moderate technical skill, with clear, purposeful lines and distinguishable objects. However, the simplicity of the shapes and lack of finer detail suggest an intermediate developmental level.".to_string(),
            image_url: "/images/scales/development.svg".to_string(),
        },
        Scale {
            title: "Details of Objects & Environment".to_string(),
            description: "Examines the level of detail and complexity in depicted objects and environmental elements.".to_string(),
            rating: 3,
            explanation: "The objects included (tree, apples, ladder, person) are identifiable but lack intricate detail. The absence of environmental elements like sky, grass, or surrounding context limits the level of detail.".to_string(),
            image_url: "/images/scales/details.svg".to_string(),
        },
        Scale {
            title: "Line Quality".to_string(),
            description: "Analyzes the characteristics of lines including pressure, continuity, and control.".to_string(),
            rating: 4,
            explanation: "The lines are clean, intentional, and confident. There are no visible signs of hesitancy or irregularity. However, they are relatively uniform in thickness and lack variation that could add dynamism.".to_string(),
            image_url: "/images/scales/line.svg".to_string(),
        },
        Scale {
            title: "Person".to_string(),
            description: "Evaluates the representation and completeness of human figures in the artwork.".to_string(),
            rating: 2,
            explanation: "The person is represented by a very minimal and abstract form (yellow and partial structure), making them identifiable but lacking in proportion, detail, or completeness.".to_string(),
            image_url: "/images/scales/person.svg".to_string(),
        },
        Scale {
            title: "Rotation".to_string(),
            description: "Examines the orientation and rotation of objects within the composition.".to_string(),
            rating: 0,
            explanation: "There are no rotated or distorted elements in the image. All components are drawn in conventional orientations.".to_string(),
            image_url: "/images/scales/rotation.svg".to_string(),
        },
        Scale {
            title: "Perseveration".to_string(),
            description: "Identifies repetitive elements and patterns in the artwork.".to_string(),
            rating: 1,
            explanation: "While there is some repetition in the apples and tree branches, it is appropriate and not excessive. This repetition adds to the natural appearance of the tree rather than detracting from the composition.".to_string(),
            image_url: "/images/scales/perseveration.svg".to_string(),
        },
    ]
}

/// 目录中全部量表标题，保持目录顺序
pub fn catalog_titles() -> Vec<String> {
    default_scales().into_iter().map(|s| s.title).collect()
}
